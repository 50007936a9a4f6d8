//! Role names and per-route allow-lists.

use std::sync::Arc;

use crate::claims::Identity;

/// Elevated role: may list every purchase, delete purchases, and read other
/// principals' purchases.
pub const ADMIN: &str = "Admin";

/// Static set of role names a route accepts.
///
/// Access is granted when the caller holds *any* listed role (set
/// intersection, not subset). An empty list grants nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList(Arc<[String]>);

impl AllowList {
    pub fn new<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }

    pub fn admin() -> Self {
        Self::new([ADMIN])
    }

    pub fn roles(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn permits(&self, identity: &Identity) -> bool {
        self.0.iter().any(|role| identity.has_role(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permits_on_any_shared_role() {
        let allow = AllowList::new(["Admin", "Auditor"]);

        assert!(allow.permits(&Identity::new(1, ["Auditor"])));
        assert!(allow.permits(&Identity::new(1, ["User", "Admin"])));
    }

    #[test]
    fn test_does_not_require_subset() {
        let allow = AllowList::new(["Admin", "Auditor"]);
        assert!(allow.permits(&Identity::new(1, ["Admin"])));
    }

    #[test]
    fn test_rejects_disjoint_roles() {
        let allow = AllowList::admin();

        assert!(!allow.permits(&Identity::new(1, ["User"])));
        assert!(!allow.permits(&Identity::new(1, Vec::<String>::new())));
    }

    #[test]
    fn test_role_match_is_case_sensitive() {
        assert!(!AllowList::admin().permits(&Identity::new(1, ["admin"])));
    }

    #[test]
    fn test_empty_allow_list_denies_everyone() {
        let allow = AllowList::new(Vec::<String>::new());

        assert!(allow.is_empty());
        assert!(!allow.permits(&Identity::new(1, ["Admin"])));
    }
}
