// shrinkray/src/server/mod.rs
//! HTTP surface: `POST /api/compress` plus a health probe.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{IMAGE_FIELD, QUALITY_FIELD};

use crate::core::{processor::Compressor, ServerConfig};
use crate::processors::Codec;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Room for multipart boundaries, headers and the quality field.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

pub struct AppState<C> {
    pub compressor: Arc<Compressor<C>>,
    pub permits: Arc<Semaphore>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            compressor: Arc::clone(&self.compressor),
            permits: Arc::clone(&self.permits),
        }
    }
}

pub fn router<C: Codec + 'static>(
    compressor: Compressor<C>,
    max_concurrent_requests: usize,
) -> Router {
    let body_limit = compressor
        .config()
        .max_file_size
        .saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let state = AppState {
        compressor: Arc::new(compressor),
        permits: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
    };

    Router::new()
        .route("/api/compress", post(handlers::compress::<C>))
        .route("/health", get(handlers::health))
        .fallback(handlers::fallback)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let compressor = Compressor::new(config.compress.clone());
    let app = router(compressor, config.max_concurrent_requests);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    log::info!("Webserver running on http://{}", listener.local_addr()?);
    log::info!(
        "Accepting uploads up to {} bytes, default quality {}",
        config.compress.max_file_size,
        config.compress.default_quality
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
    }
    log::info!("Shutting down");
}
