//! Local ingest endpoint.
//!
//! Stands in for the push-based message collaborator during local runs:
//! the raw body is enqueued for the consumer pool and the request is
//! acknowledged before processing. Failures surface asynchronously on the
//! dead-letter path, exactly as with a real broker.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use tokio::sync::mpsc::error::TrySendError;

use crate::AppState;
use crate::error::ApiError;

/// POST /ingest — enqueue one raw order message.
#[tracing::instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    match state.ingest_queue.try_send(body.to_vec()) {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(TrySendError::Full(_)) => Err(ApiError::Overloaded),
        Err(TrySendError::Closed(_)) => {
            Err(ApiError::Internal("ingest consumer stopped".to_string()))
        }
    }
}
