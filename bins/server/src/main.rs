//! Bucketdrop API Server
//!
//! Main entry point for the Bucketdrop upload service.

use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bucketdrop_api::{AppState, create_router};
use bucketdrop_core::storage::OpendalConnector;
use bucketdrop_core::upload::UploadService;
use bucketdrop_shared::{AppConfig, SettingsSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bucketdrop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Create upload service
    let settings = SettingsSource::from_config(&config);
    info!(
        endpoint = %config.storage.endpoint,
        bucket = %config.storage.bucket,
        region = %config.storage.region,
        reload_config = config.upload.reload_config,
        max_file_size = config.upload.max_file_size,
        "Storage configured"
    );
    let uploads = UploadService::new(OpendalConnector, settings)
        .with_max_file_size(config.upload.max_file_size);

    // Create router
    let app = create_router(
        AppState::new(uploads),
        Duration::from_secs(config.server.request_timeout_secs),
    );

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
