mod api_doc;
mod app;
mod blob_store;
mod config;
mod data_store;
mod error;
mod handlers;
mod models;
mod profiles;
mod reservations;
mod routes;
mod spanner;
mod state;
mod timestamp;

use anyhow::Context;
use axum::{extract::Request, ServiceExt};
use blob_store::{BlobStore, MemoryBlobStore};
use config::{BlobBackend, Config};
use spanner::SpannerBlobStore;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("Failed to load .env file");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("courier-reservations starting");

    let config = Config::from_env()?;
    config.log_startup();

    let blobs: Arc<dyn BlobStore> = match &config.backend {
        BlobBackend::Spanner(settings) => {
            Arc::new(SpannerBlobStore::connect(settings, &config.store_name).await?)
        }
        BlobBackend::Memory => Arc::new(MemoryBlobStore::new()),
    };

    let bind_address = config.bind_address();
    let state = AppState::new(blobs, timestamp::system_clock(), config);
    let app = app::build(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Listening on {}", bind_address);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("courier-reservations stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
