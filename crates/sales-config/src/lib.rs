//! # Sales Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: token signing secret and lifetime
//! - [`database`]: PostgreSQL connection pool settings
//! - [`cors`]: allowed browser origins
//!
//! # Example
//!
//! ```ignore
//! use sales_config::{CorsConfig, DatabaseConfig, JwtConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let database_config = DatabaseConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! ```

pub mod cors;
pub mod database;
pub mod jwt;

pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
