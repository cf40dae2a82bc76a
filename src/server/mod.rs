//! HTTP API over the job registry.
//!
//! - `GET /files` returns every job snapshot in submission order.
//! - `POST /files/add` with `{"url": "..."}` submits a job and returns its
//!   initial snapshot with `201 Created`.
//!
//! Other methods on these paths get `405 Method Not Allowed`.

mod error;
mod handlers;

pub use error::ApiError;

use std::future::Future;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::info;

use crate::coordinator::Coordinator;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    coordinator: Coordinator,
}

impl AppState {
    /// Wraps the coordinator that handlers submit through.
    #[must_use]
    pub fn new(coordinator: Coordinator) -> Self {
        Self { coordinator }
    }
}

/// Builds the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/files", get(handlers::list_files))
        .route("/files/add", post(handlers::add_file))
        .with_state(state)
}

/// Serves the API on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "server listening");
    }
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
