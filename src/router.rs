use axum::Router;
use axum::http::{HeaderValue, Method, header};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::metrics::metrics_router;
use crate::middleware::chain::ChainError;
use crate::modules::purchases::init_purchases_router;
use crate::state::AppState;

/// Builds the full application router.
///
/// Fails if any route's stage chain is out of order.
pub fn init_router(
    state: AppState,
    metrics: Option<PrometheusHandle>,
) -> Result<Router, ChainError> {
    let api = Router::new().nest("/purchases", init_purchases_router(&state)?);

    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api);

    if let Some(handle) = metrics {
        router = router.merge(metrics_router(handle));
    }

    let cors = cors_layer(&state);

    Ok(router.with_state(state).layer(cors))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
