//! Driftbox API Server
//!
//! Main entry point for the Driftbox temporary file sharing service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driftbox_api::{AppState, create_router};
use driftbox_core::clock::{Clock, SystemClock};
use driftbox_core::space::{SpaceService, SweeperConfig, spawn_sweeper};
use driftbox_core::storage::{StorageConfig, create_store};
use driftbox_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driftbox=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect object store, failing fast on missing credentials
    let storage_config = StorageConfig::from_settings(&config.storage)
        .context("Invalid storage configuration")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = create_store(&storage_config, Arc::clone(&clock))
        .context("Failed to initialize object store")?;
    info!(
        provider = store.provider_name(),
        bucket = storage_config.provider.bucket(),
        retention_secs = storage_config.retention_secs,
        "Object store configured"
    );

    let spaces = Arc::new(SpaceService::new(store, storage_config, clock));

    // Scheduled cleanup
    let sweeper = config.cleanup.enabled.then(|| {
        spawn_sweeper(
            Arc::clone(&spaces),
            SweeperConfig::every(Duration::from_secs(config.cleanup.interval_secs.max(1))),
        )
    });

    // Create application state
    let state = AppState::new(spaces).with_cleanup_token(config.cleanup.auth_token.clone());

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.shutdown().await;
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
