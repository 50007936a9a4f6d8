//! # Sales Auth
//!
//! Identity and token handling for the Sales API.
//!
//! - [`claims`]: the signed token payload ([`Claims`]) and the per-request
//!   [`Identity`] built from it
//! - [`roles`]: role names and the static per-route [`AllowList`]
//! - [`jwt`]: token signing and verification, generic over the claims type
//!
//! # Example
//!
//! ```ignore
//! use sales_auth::{Claims, Identity, create_access_token, verify_token};
//! use sales_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(7, vec!["Admin".to_string()], &config)?;
//!
//! let identity: Identity = verify_token::<Claims>(&token, &config)?.into();
//! assert_eq!(identity.subject_id(), 7);
//! ```

pub mod claims;
pub mod jwt;
pub mod roles;

pub use claims::{Claims, Identity};
pub use jwt::{create_access_token, encode_token, verify_token};
pub use roles::AllowList;
