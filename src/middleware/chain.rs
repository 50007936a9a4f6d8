//! Ordered composition of request stages around a route.
//!
//! A [`Chain`] lists stages in execution order: the first stage is the
//! outermost layer and sees the request first. [`Chain::apply`] validates
//! the order and wraps a `MethodRouter` with one `route_layer` per stage.

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::MethodRouter;
use thiserror::Error;

use sales_auth::{AllowList, Claims};
use sales_config::JwtConfig;

use crate::logging::{RouteLabel, observe_request};
use crate::middleware::auth::require_identity;
use crate::middleware::identity::extract_identity;
use crate::middleware::role::require_roles;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Access log and metrics under the given route label.
    Observe(&'static str),
    /// Publish the bearer token's identity, if any.
    Identify,
    /// 401 unless an identity was published.
    Authenticate,
    /// 403 unless the identity holds a listed role.
    Authorize(AllowList),
}

impl Stage {
    /// Position in the canonical execution order.
    fn rank(&self) -> u8 {
        match self {
            Stage::Observe(_) => 0,
            Stage::Identify => 1,
            Stage::Authenticate => 2,
            Stage::Authorize(_) => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Observe(_) => "observe",
            Stage::Identify => "identify",
            Stage::Authenticate => "authenticate",
            Stage::Authorize(_) => "authorize",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("{stage} stage at position {position} runs before identity extraction")]
    GuardBeforeIdentity { stage: &'static str, position: usize },

    #[error("authorize stage at position {position} runs before authentication")]
    AuthorizeBeforeAuthenticate { position: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    stages: Vec<Stage>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a chain from a registration listing written innermost-first
    /// (handler side first, observer last).
    ///
    /// Stages are put in execution order by kind: observe, identify,
    /// authenticate, authorize. Stages of the same kind run in reverse listing
    /// order, so the last one listed is the outermost. Guards may therefore be
    /// listed in any order relative to each other.
    pub fn from_registration<I>(stages: I) -> Self
    where
        I: IntoIterator<Item = Stage>,
    {
        let mut stages: Vec<Stage> = stages.into_iter().collect();
        stages.reverse();
        stages.sort_by_key(Stage::rank);
        Self { stages }
    }

    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn observe(self, label: &'static str) -> Self {
        self.then(Stage::Observe(label))
    }

    pub fn identify(self) -> Self {
        self.then(Stage::Identify)
    }

    pub fn authenticate(self) -> Self {
        self.then(Stage::Authenticate)
    }

    pub fn authorize(self, allow: AllowList) -> Self {
        self.then(Stage::Authorize(allow))
    }

    /// Runs `other`'s stages inside this chain's stages.
    pub fn append(mut self, other: Chain) -> Self {
        self.stages.extend(other.stages);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Checks that guards only run once an identity could exist, and that
    /// authorization never runs ahead of authentication.
    pub fn validate(&self) -> Result<(), ChainError> {
        let mut identified = false;
        let mut authenticated = false;

        for (position, stage) in self.stages.iter().enumerate() {
            match stage {
                Stage::Observe(_) => {}
                Stage::Identify => identified = true,
                Stage::Authenticate | Stage::Authorize(_) if !identified => {
                    return Err(ChainError::GuardBeforeIdentity {
                        stage: stage.name(),
                        position,
                    });
                }
                Stage::Authenticate => authenticated = true,
                Stage::Authorize(_) if !authenticated => {
                    return Err(ChainError::AuthorizeBeforeAuthenticate { position });
                }
                Stage::Authorize(allow) => {
                    if allow.is_empty() {
                        tracing::warn!(position, "Empty allow-list denies every request");
                    }
                }
            }
        }

        Ok(())
    }

    /// Wraps `route` so that the first stage is the outermost layer.
    pub fn apply<S>(
        &self,
        route: MethodRouter<S>,
        jwt_config: &JwtConfig,
    ) -> Result<MethodRouter<S>, ChainError>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.validate()?;

        // route_layer wraps whatever is already there, so the innermost
        // stage has to be added first.
        let route = self.stages.iter().rev().fold(route, |route, stage| match stage {
            Stage::Observe(label) => {
                route.route_layer(from_fn_with_state(RouteLabel(*label), observe_request))
            }
            Stage::Identify => route.route_layer(from_fn_with_state(
                jwt_config.clone(),
                extract_identity::<Claims>,
            )),
            Stage::Authenticate => route.route_layer(from_fn(require_identity)),
            Stage::Authorize(allow) => {
                route.route_layer(from_fn_with_state(allow.clone(), require_roles))
            }
        });

        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;
    use sales_auth::create_access_token;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
        }
    }

    fn admin_chain() -> Chain {
        admin_chain_labelled("test")
    }

    fn admin_chain_labelled(label: &'static str) -> Chain {
        Chain::new()
            .observe(label)
            .identify()
            .authenticate()
            .authorize(AllowList::admin())
    }

    async fn call(chain: &Chain, roles: Option<&[&str]>) -> StatusCode {
        let config = jwt_config();
        let app: Router = Router::new().route(
            "/",
            chain.apply(get(|| async { "ok" }), &config).unwrap(),
        );

        let mut request = Request::builder().uri("/");
        if let Some(roles) = roles {
            let token = create_access_token(
                1,
                roles.iter().map(|r| r.to_string()).collect(),
                &config,
            )
            .unwrap();
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn test_registration_listing_is_put_in_execution_order() {
        let chain = Chain::from_registration([
            Stage::Authenticate,
            Stage::Authorize(AllowList::admin()),
            Stage::Identify,
            Stage::Observe("get list"),
        ]);

        assert_eq!(chain, admin_chain_labelled("get list"));
        assert_eq!(chain.validate(), Ok(()));
    }

    #[test]
    fn test_reversed_registration_listing_is_put_in_execution_order() {
        let chain = Chain::from_registration([
            Stage::Authorize(AllowList::admin()),
            Stage::Authenticate,
            Stage::Identify,
            Stage::Observe("get list"),
        ]);

        assert_eq!(chain, admin_chain_labelled("get list"));
    }

    #[test]
    fn test_registration_keeps_same_kind_stages_outermost_last() {
        let chain = Chain::from_registration([
            Stage::Authorize(AllowList::new(["User"])),
            Stage::Authenticate,
            Stage::Authorize(AllowList::admin()),
            Stage::Identify,
        ]);

        assert_eq!(
            chain.stages(),
            &[
                Stage::Identify,
                Stage::Authenticate,
                Stage::Authorize(AllowList::admin()),
                Stage::Authorize(AllowList::new(["User"])),
            ]
        );
    }

    #[tokio::test]
    async fn test_registered_chain_answers_401_then_403() {
        let chain = Chain::from_registration([
            Stage::Authenticate,
            Stage::Authorize(AllowList::admin()),
            Stage::Identify,
            Stage::Observe("get list"),
        ]);

        assert_eq!(call(&chain, None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(call(&chain, Some(&["User"][..])).await, StatusCode::FORBIDDEN);
        assert_eq!(call(&chain, Some(&["Admin"][..])).await, StatusCode::OK);
    }

    #[test]
    fn test_append_is_associative() {
        let a = Chain::new().observe("a");
        let b = Chain::new().identify();
        let c = Chain::new().authenticate();

        assert_eq!(
            a.clone().append(b.clone()).append(c.clone()),
            a.append(b.append(c))
        );
    }

    #[test]
    fn test_validate_accepts_canonical_order() {
        assert_eq!(admin_chain().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_guard_before_identity() {
        let chain = Chain::new().authenticate().identify();

        assert_eq!(
            chain.validate(),
            Err(ChainError::GuardBeforeIdentity {
                stage: "authenticate",
                position: 0,
            })
        );
    }

    #[test]
    fn test_validate_rejects_unnormalized_registration_listing() {
        let chain = Chain::new()
            .authorize(AllowList::admin())
            .authenticate()
            .identify()
            .observe("x");

        assert!(matches!(
            chain.validate(),
            Err(ChainError::GuardBeforeIdentity { stage: "authorize", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_authorize_before_authenticate() {
        let chain = Chain::new()
            .identify()
            .authorize(AllowList::admin())
            .authenticate();

        assert_eq!(
            chain.validate(),
            Err(ChainError::AuthorizeBeforeAuthenticate { position: 1 })
        );
    }

    #[test]
    fn test_apply_refuses_invalid_chain() {
        let chain = Chain::new().authenticate();
        let result = chain.apply::<()>(get(|| async { "ok" }), &jwt_config());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_identity_is_401_before_403() {
        assert_eq!(call(&admin_chain(), None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_role_is_403() {
        assert_eq!(
            call(&admin_chain(), Some(&["User"][..])).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_allowed_role_reaches_handler() {
        assert_eq!(
            call(&admin_chain(), Some(&["User", "Admin"][..])).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_role_guard_alone_answers_401_without_identity() {
        let app: Router = Router::new().route(
            "/",
            get(|| async { "ok" })
                .route_layer(from_fn_with_state(AllowList::admin(), require_roles)),
        );

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_empty_allow_list_denies_all() {
        let chain = Chain::new()
            .identify()
            .authenticate()
            .authorize(AllowList::new(Vec::<String>::new()));
        assert_eq!(
            call(&chain, Some(&["Admin"][..])).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_identify_alone_never_rejects() {
        let chain = Chain::new().identify();
        assert_eq!(call(&chain, None).await, StatusCode::OK);
    }
}
