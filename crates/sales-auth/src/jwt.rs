//! JWT signing and verification.
//!
//! Tokens are HS256-signed with the shared secret from [`JwtConfig`].
//! Verification is generic over the claims type so callers pick the payload
//! shape at compile time:
//!
//! ```ignore
//! let claims: Claims = verify_token(token, &jwt_config)?;
//! ```

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Serialize, de::DeserializeOwned};

use sales_config::JwtConfig;
use sales_core::AppError;

use crate::claims::Claims;

/// Signs any serializable claims value.
pub fn encode_token<C: Serialize>(claims: &C, jwt_config: &JwtConfig) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {e}")))
}

/// Issues an access token for `subject_id` carrying `roles`.
pub fn create_access_token(
    subject_id: i64,
    roles: Vec<String>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry as usize;

    encode_token(
        &Claims {
            sub: subject_id,
            roles,
            exp,
            iat: now,
        },
        jwt_config,
    )
}

/// Verifies signature and expiry, then decodes the payload into `C`.
///
/// # Errors
///
/// Returns an unauthorized error if the token is malformed, signed with a
/// different secret, expired, or does not match the shape of `C`.
pub fn verify_token<C: DeserializeOwned>(token: &str, jwt_config: &JwtConfig) -> Result<C, AppError> {
    decode::<C>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::unauthorized(format!("Invalid or expired token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
        }
    }

    #[test]
    fn test_create_and_verify_access_token() {
        let config = get_test_jwt_config();

        let token = create_access_token(7, vec!["Admin".to_string()], &config).unwrap();
        let claims: Claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.roles, vec!["Admin".to_string()]);
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn test_verify_token_malformed() {
        let config = get_test_jwt_config();
        assert!(verify_token::<Claims>("not-a-token", &config).is_err());
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let config = get_test_jwt_config();
        let token = create_access_token(7, vec![], &config).unwrap();

        let wrong_config = JwtConfig {
            secret: "different-secret-key-at-least-32-characters".to_string(),
            access_token_expiry: 3600,
        };

        let err = verify_token::<Claims>(&token, &wrong_config).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_verify_token_expired() {
        let config = get_test_jwt_config();
        let issued = Utc::now().timestamp() as usize - 7200;
        let token = encode_token(
            &Claims {
                sub: 7,
                roles: vec![],
                exp: issued + 60,
                iat: issued,
            },
            &config,
        )
        .unwrap();

        assert!(verify_token::<Claims>(&token, &config).is_err());
    }

    #[test]
    fn test_verify_token_into_caller_chosen_shape() {
        #[derive(Debug, Deserialize)]
        struct SubjectOnly {
            sub: i64,
        }

        let config = get_test_jwt_config();
        let token = create_access_token(42, vec!["User".to_string()], &config).unwrap();

        let claims: SubjectOnly = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, 42);
    }
}
