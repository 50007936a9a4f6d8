use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::modules::purchases::model::{Purchase, SavePurchaseDto};

/// Error body returned for every 4xx/5xx response.
#[derive(serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::purchases::controller::list_purchases,
        crate::modules::purchases::controller::get_purchase,
        crate::modules::purchases::controller::list_purchases_by_owner,
        crate::modules::purchases::controller::save_purchase,
        crate::modules::purchases::controller::delete_purchase,
    ),
    components(schemas(Purchase, SavePurchaseDto, ErrorResponse)),
    modifiers(&SecurityAddon),
    tags(
        (name = "Purchases", description = "Purchase records")
    ),
    info(
        title = "Sales API",
        version = "0.1.0",
        description = "Purchase records behind JWT authentication and role checks.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_purchase_routes() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/purchases"));
        assert!(doc.paths.paths.contains_key("/api/purchases/{id}"));
        assert!(doc.paths.paths.contains_key("/api/purchases/users/{id}"));
    }

    #[test]
    fn test_openapi_declares_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
