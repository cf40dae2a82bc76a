//! Request handlers for the job API.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::AppState;
use super::error::ApiError;
use crate::job::JobView;

/// Body of `POST /files/add`.
#[derive(Debug, Deserialize)]
pub(crate) struct AddFileRequest {
    url: String,
}

/// `GET /files`: every job, in submission order.
pub(crate) async fn list_files(State(state): State<AppState>) -> Json<Vec<JobView>> {
    Json(state.coordinator.registry().snapshot())
}

/// `POST /files/add`: registers a job and starts its download.
///
/// The body is decoded as JSON whatever the `Content-Type` says.
pub(crate) async fn add_file(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<JobView>), ApiError> {
    let request: AddFileRequest = serde_json::from_slice(&body).inspect_err(|e| {
        debug!(error = %e, "rejecting malformed submission");
    })?;
    let view = state.coordinator.submit(&request.url)?;
    Ok((StatusCode::CREATED, Json(view)))
}
