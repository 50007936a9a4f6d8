use axum::{
    Router,
    routing::{delete, get, post},
};

use sales_auth::AllowList;

use crate::middleware::chain::{Chain, ChainError};
use crate::state::AppState;

use super::controller::{
    delete_purchase, get_purchase, list_purchases, list_purchases_by_owner, save_purchase,
};

fn secured(label: &'static str) -> Chain {
    Chain::new().observe(label).identify().authenticate()
}

/// Purchase routes, each wrapped in its own stage chain.
///
/// Ownership rules for `/users/{id}` live in the handler because they depend
/// on the path, not only on the caller's roles.
pub fn init_purchases_router(state: &AppState) -> Result<Router<AppState>, ChainError> {
    let jwt = &state.jwt_config;
    let admin_only = |label| secured(label).authorize(AllowList::admin());

    Ok(Router::new()
        .route("/", admin_only("get list").apply(get(list_purchases), jwt)?)
        .route("/{id}", secured("get purchase").apply(get(get_purchase), jwt)?)
        .route("/{id}", secured("save purchase").apply(post(save_purchase), jwt)?)
        .route(
            "/{id}",
            admin_only("delete purchase").apply(delete(delete_purchase), jwt)?,
        )
        .route(
            "/users/{id}",
            secured("get by user").apply(get(list_purchases_by_owner), jwt)?,
        ))
}
