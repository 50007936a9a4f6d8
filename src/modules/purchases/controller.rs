use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use sales_auth::{Identity, roles::ADMIN};
use sales_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::purchases::model::{Purchase, SavePurchaseDto};
use crate::modules::purchases::service::PurchaseService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/purchases",
    responses(
        (status = 200, description = "Every active purchase ordered by id", body = Vec<Purchase>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires Admin role")
    ),
    tag = "Purchases",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_purchases(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
) -> Result<Json<Vec<Purchase>>, AppError> {
    let purchases = PurchaseService::list(state.store.as_ref()).await?;
    Ok(Json(purchases))
}

#[utoipa::path(
    get,
    path = "/api/purchases/{id}",
    params(("id" = i64, Path, description = "Purchase ID")),
    responses(
        (status = 200, description = "Purchase details", body = Purchase),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Purchase not found or removed")
    ),
    tag = "Purchases",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_purchase(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Purchase>, AppError> {
    let purchase = PurchaseService::get_by_id(state.store.as_ref(), id).await?;
    Ok(Json(purchase))
}

#[utoipa::path(
    get,
    path = "/api/purchases/users/{id}",
    params(("id" = i64, Path, description = "Owner ID; 0 means the caller")),
    responses(
        (status = 200, description = "Active purchases of the owner", body = Vec<Purchase>),
        (status = 400, description = "Negative or malformed id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - another owner's purchases require Admin role")
    ),
    tag = "Purchases",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_purchases_by_owner(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Purchase>>, AppError> {
    let owner_id = resolve_owner(&identity, id)?;
    let purchases = PurchaseService::list_by_owner(state.store.as_ref(), owner_id).await?;
    Ok(Json(purchases))
}

/// `0` and the caller's own id both mean "my purchases". Any other owner is
/// visible to admins only.
pub fn resolve_owner(identity: &Identity, requested: i64) -> Result<i64, AppError> {
    if requested < 0 {
        return Err(AppError::bad_request(anyhow!("Invalid owner id")));
    }

    if requested == 0 || requested == identity.subject_id() {
        return Ok(identity.subject_id());
    }

    if identity.has_role(ADMIN) {
        Ok(requested)
    } else {
        Err(AppError::forbidden("Access denied"))
    }
}

#[utoipa::path(
    post,
    path = "/api/purchases/{id}",
    params(("id" = i64, Path, description = "0 creates a purchase, a positive id updates it")),
    request_body = SavePurchaseDto,
    responses(
        (status = 204, description = "Purchase created (Location header set) or updated"),
        (status = 400, description = "Negative id, invalid body or content type"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Purchase not found or removed")
    ),
    tag = "Purchases",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn save_purchase(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<SavePurchaseDto>,
) -> Result<Response, AppError> {
    if id < 0 {
        return Err(AppError::bad_request(anyhow!("Invalid purchase id")));
    }

    if let Some(claimed) = dto.owner_id
        && claimed != identity.subject_id()
    {
        tracing::warn!(
            subject_id = identity.subject_id(),
            claimed_owner = claimed,
            "Ignoring owner_id from request body"
        );
    }

    if id == 0 {
        let purchase = dto.into_new_purchase(identity.subject_id())?;
        let created = PurchaseService::create(state.store.as_ref(), purchase).await?;
        let location = format!("/api/purchases/{created}");
        return Ok((StatusCode::NO_CONTENT, [(header::LOCATION, location)]).into_response());
    }

    let patch = dto.into_patch()?;
    PurchaseService::sparse_update(state.store.as_ref(), id, patch).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    delete,
    path = "/api/purchases/{id}",
    params(("id" = i64, Path, description = "Purchase ID")),
    responses(
        (status = 204, description = "Purchase removed, or already absent"),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires Admin role")
    ),
    tag = "Purchases",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_purchase(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    PurchaseService::soft_delete(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
