//! HTTP API for submitting and inspecting crawls
//!
//! Routes:
//! - `POST /crawl` with `{ "keyword": "..." }` starts a crawl and returns its id
//! - `GET /crawl/:id` returns the crawl status and matched URLs
//! - `GET /health` reports liveness and the number of stored jobs
//!
//! Errors are returned as `{ "status": <code>, "message": <text> }`.

mod error;
mod handlers;

pub use error::{ApiError, ErrorBody};
pub use handlers::{CrawlRequest, CreatedResponse, HealthResponse};

use crate::service::JobRegistry;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builds the API router around a shared registry
pub fn router(registry: Arc<JobRegistry>) -> Router {
    Router::new()
        .route("/crawl", post(handlers::create_crawl))
        .route("/crawl/:id", get(handlers::get_crawl))
        .route("/health", get(handlers::health))
        .with_state(registry)
}

/// Serves the API on `listener` until `shutdown` resolves
///
/// In-flight requests are allowed to complete; the registry itself is not
/// shut down here.
pub async fn serve<F>(
    listener: TcpListener,
    registry: Arc<JobRegistry>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown)
        .await
}
