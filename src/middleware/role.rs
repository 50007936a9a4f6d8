//! Role-based authorization stage.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use sales_auth::AllowList;
use sales_core::AppError;

use crate::middleware::identity::current_identity;

/// Forwards the request iff the caller holds any role on `allow`.
///
/// Without an identity this answers 401 rather than 403, so "unauthenticated"
/// always wins over "forbidden" even if the stage is mounted on its own.
///
/// # Usage with axum::middleware::from_fn_with_state
///
/// ```rust,ignore
/// use axum::{middleware, routing::delete};
/// use sales_auth::AllowList;
///
/// let route = delete(delete_purchase)
///     .route_layer(middleware::from_fn_with_state(AllowList::admin(), require_roles));
/// ```
pub async fn require_roles(
    State(allow): State<AllowList>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(identity) = current_identity(req.extensions()) else {
        return Err(AppError::unauthorized("Authentication required"));
    };

    if !allow.permits(identity) {
        tracing::warn!(
            subject_id = identity.subject_id(),
            required = ?allow.roles(),
            "Access denied"
        );
        return Err(AppError::forbidden("Access denied"));
    }

    tracing::debug!(subject_id = identity.subject_id(), "Access granted");
    Ok(next.run(req).await)
}
