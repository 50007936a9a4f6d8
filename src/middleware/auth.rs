use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use sales_auth::Identity;
use sales_core::AppError;

use crate::middleware::identity::current_identity;

/// Rejects the request with 401 unless an identity was published upstream.
pub async fn require_identity(req: Request, next: Next) -> Result<Response, AppError> {
    if current_identity(req.extensions()).is_none() {
        return Err(AppError::unauthorized("Authentication required"));
    }

    Ok(next.run(req).await)
}

/// Extractor for the caller's identity inside handlers.
///
/// Reads what [`extract_identity`](super::identity::extract_identity) published
/// and answers 401 when there is none, so a handler mounted without the
/// guard still fails closed.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl AuthUser {
    pub fn subject_id(&self) -> i64 {
        self.0.subject_id()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_identity(&parts.extensions)
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}
