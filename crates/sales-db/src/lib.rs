//! # Sales DB
//!
//! PostgreSQL connection pool construction for the Sales API.
//!
//! # Example
//!
//! ```ignore
//! use sales_config::DatabaseConfig;
//! use sales_db::init_db_pool;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sqlx::Error> {
//!     let pool = init_db_pool(&DatabaseConfig::from_env()).await?;
//!     // hand the pool to the purchase store
//!     Ok(())
//! }
//! ```

use sales_config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;

pub use sqlx::PgPool;

/// Opens a PostgreSQL connection pool.
///
/// The pool bounds concurrency: each logical store operation borrows one
/// connection and hands it back when dropped, on success and failure alike.
/// A request waiting longer than `acquire_timeout` fails with
/// [`sqlx::Error::PoolTimedOut`].
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        "Connecting to database"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await
}
