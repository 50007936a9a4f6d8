use axum::{
    extract::{Request, State},
    http::Extensions,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde::de::DeserializeOwned;

use sales_auth::{Identity, verify_token};
use sales_config::JwtConfig;

/// Decodes the bearer token into claims of type `C` and publishes the
/// resulting [`Identity`] into the request extensions.
///
/// Never rejects: a missing header, another scheme, or a token that fails
/// verification just leaves the request anonymous. Rejection belongs to
/// [`require_identity`](super::auth::require_identity).
pub async fn extract_identity<C>(
    State(jwt_config): State<JwtConfig>,
    mut req: Request,
    next: Next,
) -> Response
where
    C: DeserializeOwned + Into<Identity>,
{
    match req.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) => match verify_token::<C>(bearer.token(), &jwt_config) {
            Ok(claims) => {
                let identity: Identity = claims.into();
                tracing::debug!(subject_id = identity.subject_id(), "Identity extracted");
                req.extensions_mut().insert(identity);
            }
            Err(err) => {
                tracing::debug!(error = %err.error, "Bearer token rejected");
            }
        },
        None => tracing::debug!("No bearer credential on request"),
    }

    next.run(req).await
}

/// Identity published by [`extract_identity`], if any.
pub fn current_identity(extensions: &Extensions) -> Option<&Identity> {
    extensions.get::<Identity>()
}
