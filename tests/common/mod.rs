#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use sales::modules::purchases::memory::MemoryPurchaseStore;
use sales::router::init_router;
use sales::state::AppState;
use sales_auth::create_access_token;
use sales_config::{CorsConfig, JwtConfig};

pub const ADMIN_ID: i64 = 1;
pub const USER_ID: i64 = 7;
pub const OTHER_USER_ID: i64 = 8;

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-key-at-least-32-characters-long".to_string(),
        access_token_expiry: 3600,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryPurchaseStore,
}

pub fn setup_test_app() -> TestApp {
    let store = MemoryPurchaseStore::new();
    let state = AppState::new(store.clone(), test_jwt_config(), CorsConfig::default());
    let router = init_router(state, None).unwrap();

    TestApp { router, store }
}

pub fn token(subject_id: i64, roles: &[&str]) -> String {
    create_access_token(
        subject_id,
        roles.iter().map(|r| r.to_string()).collect(),
        &test_jwt_config(),
    )
    .unwrap()
}

pub fn admin_token() -> String {
    token(ADMIN_ID, &["Admin"])
}

pub fn user_token() -> String {
    token(USER_ID, &["User"])
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

pub async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        location,
        body,
    }
}

/// Creates a purchase as `token`'s subject and returns its id.
pub async fn create_purchase(app: &TestApp, token: &str, product_id: i64, price: i32, quantity: i32) -> i64 {
    let response = send(
        app,
        "POST",
        "/api/purchases/0",
        Some(token),
        Some(serde_json::json!({
            "product_id": product_id,
            "price": price,
            "quantity": quantity
        })),
    )
    .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    response
        .location
        .and_then(|l| l.rsplit('/').next().map(str::to_string))
        .and_then(|id| id.parse().ok())
        .unwrap()
}
