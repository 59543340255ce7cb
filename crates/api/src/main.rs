use anyhow::{Context, Result};
use showme_api::{build_app, ServiceConfig};
use showme_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("showme_api");

    let config = ServiceConfig::from_env().context("invalid startup configuration")?;
    let app = build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(
        bind = %config.bind,
        model = %config.model,
        origins = ?config.allowed_origins(),
        "show me itinerary api started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
