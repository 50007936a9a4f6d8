use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use sales_core::AppError;

fn format_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|field| format!("{field} is invalid"))
        .collect();
    fields.sort();
    fields.join(", ")
}

/// JSON body extractor that also runs `validator` rules.
///
/// Every rejection, including a missing `Content-Type: application/json`
/// header, is a 400 with a short message.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(rejection = %rejection.body_text(), "Rejected request body");

                match rejection {
                    JsonRejection::MissingJsonContentType(_) => AppError::bad_request(anyhow!(
                        "Missing 'Content-Type: application/json' header"
                    )),
                    JsonRejection::JsonDataError(_) => {
                        AppError::bad_request(anyhow!("Invalid field type in request"))
                    }
                    _ => AppError::bad_request(anyhow!("Invalid request body")),
                }
            })?;

        value
            .validate()
            .map_err(|errors| AppError::bad_request(anyhow!("{}", format_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{StatusCode, header},
    };
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(range(min = -1))]
        price: i32,
    }

    fn request(content_type: Option<&str>, body: &str) -> Request {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn extract(req: Request) -> Result<ValidatedJson<Payload>, AppError> {
        ValidatedJson::<Payload>::from_request(req, &()).await
    }

    #[tokio::test]
    async fn test_accepts_valid_body() {
        let ValidatedJson(payload) = extract(request(Some("application/json"), r#"{"price": 3}"#))
            .await
            .unwrap();
        assert_eq!(payload.price, 3);
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_400() {
        let err = extract(request(Some("text/plain"), r#"{"price": 3}"#))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let err = extract(request(Some("application/json"), "{"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validation_failure_is_400() {
        let err = extract(request(Some("application/json"), r#"{"price": -7}"#))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error.to_string(), "price is invalid");
    }
}
