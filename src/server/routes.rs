//! HTTP server setup and routing

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::pipeline::JobSubmitter;
use crate::storage::BlobStore;
use crate::{NotescribeError, Result};

/// Multipart framing on top of the file itself
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn BlobStore>,
    pub jobs: JobSubmitter,
    /// Largest accepted audio file
    pub max_upload_bytes: usize,
}

/// Build the router for the upload endpoints.
pub fn build_router(ctx: AppContext) -> Router {
    let body_limit = ctx.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(super::handlers::health))
        .route("/transcribe", post(super::handlers::transcribe))
        .route(super::handlers::SUCCESS_PATH, get(super::handlers::upload_success))
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

/// Serve the router until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| NotescribeError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
