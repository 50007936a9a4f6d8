use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::info;

use sales::cli::{Cli, Commands, ServeArgs};
use sales::logging::init_tracing;
use sales::metrics::init_metrics;
use sales::router::init_router;
use sales::state::init_app_state;
use sales_auth::create_access_token;
use sales_config::{CorsConfig, DatabaseConfig, JwtConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    match Cli::parse().into_command() {
        Commands::Serve(args) => serve(args).await,
        Commands::IssueToken { subject, roles } => {
            let token = create_access_token(subject, roles, &JwtConfig::from_env())
                .map_err(|e| e.error)?;
            println!("{token}");
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    init_tracing()?;
    let metrics = init_metrics();

    let mut database = DatabaseConfig::from_env();
    if let Some(url) = args.database_url {
        database = database.with_url(url);
    }

    let state = init_app_state(&database, JwtConfig::from_env(), CorsConfig::from_env())
        .await
        .context("failed to initialize application state")?;
    let app = init_router(state, metrics)?;

    let listener = TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", args.host, args.port))?;

    info!(host = %args.host, port = args.port, "Server running");
    info!("Swagger UI available at /swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
