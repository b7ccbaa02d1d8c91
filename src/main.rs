// External crates
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

// Local modules
use price_signal_forecaster::api::routes::create_router;
use price_signal_forecaster::api::state::AppState;
use price_signal_forecaster::build_info;
use price_signal_forecaster::config::ServiceConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let config = ServiceConfig::from_env();
    let addr = config
        .socket_addr()
        .with_context(|| format!("Invalid API_HOST/API_PORT: {}:{}", config.host, config.port))?;

    info!(
        version = build_info::PKG_VERSION,
        data_source = ?config.data_source,
        training_timeout_secs = config.training_timeout.as_secs(),
        "Starting price signal server"
    );

    let state = AppState::from_config(config).context("Failed to build market data client")?;
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
