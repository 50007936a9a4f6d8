use std::sync::Arc;

use sales_config::{CorsConfig, DatabaseConfig, JwtConfig};
use sales_db::init_db_pool;

use crate::modules::purchases::PurchaseStore;
use crate::modules::purchases::postgres::PgPurchaseStore;

/// Shared per-process state handed to the router. Stages receive the parts
/// they need through `from_fn_with_state`, handlers through `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PurchaseStore>,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
}

impl AppState {
    pub fn new<P>(store: P, jwt_config: JwtConfig, cors_config: CorsConfig) -> Self
    where
        P: PurchaseStore + 'static,
    {
        Self {
            store: Arc::new(store),
            jwt_config,
            cors_config,
        }
    }
}

/// Connects to Postgres, applies pending migrations and builds the state.
pub async fn init_app_state(
    database: &DatabaseConfig,
    jwt_config: JwtConfig,
    cors_config: CorsConfig,
) -> anyhow::Result<AppState> {
    let pool = init_db_pool(database).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(AppState::new(
        PgPurchaseStore::new(pool),
        jwt_config,
        cors_config,
    ))
}
