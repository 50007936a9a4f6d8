//! Token payload and the identity published for each request.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// JWT claims carried by access tokens.
///
/// - `sub`: the principal's numeric id
/// - `roles`: role names granted to the principal
/// - `exp` / `iat`: expiry and issued-at (Unix timestamps)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

/// The verified caller of a request.
///
/// Built fresh from [`Claims`] for every request and never persisted. Fields
/// are private so nothing downstream can change who the caller is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    subject_id: i64,
    roles: BTreeSet<String>,
}

impl Identity {
    pub fn new<I, R>(subject_id: i64, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            subject_id,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn subject_id(&self) -> i64 {
        self.subject_id
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Case-sensitive role membership.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self::new(claims.sub, claims.roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_deserialize() {
        let json = r#"{"sub":7,"roles":["Admin","User"],"exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.roles, vec!["Admin", "User"]);
        assert_eq!(claims.exp, 9999999999);
    }

    #[test]
    fn test_claims_roles_default_to_empty() {
        let json = r#"{"sub":3,"exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn test_identity_from_claims_dedupes_roles() {
        let identity = Identity::from(Claims {
            sub: 11,
            roles: vec!["User".into(), "User".into(), "Admin".into()],
            exp: 0,
            iat: 0,
        });

        assert_eq!(identity.subject_id(), 11);
        assert_eq!(identity.roles().len(), 2);
        assert!(identity.has_role("Admin"));
    }

    #[test]
    fn test_has_role_is_case_sensitive() {
        let identity = Identity::new(1, ["Admin"]);
        assert!(identity.has_role("Admin"));
        assert!(!identity.has_role("admin"));
    }
}
