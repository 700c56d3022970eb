//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{GetCustomerOrdersError, StoreError, ValidationError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Malformed order data.
    Validation(ValidationError),
    /// Store failure.
    Store(StoreError),
    /// The ingest queue cannot accept messages right now.
    Overloaded,
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Overloaded => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ingest queue is full".to_string(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<GetCustomerOrdersError> for ApiError {
    fn from(err: GetCustomerOrdersError) -> Self {
        match err {
            GetCustomerOrdersError::CustomerNotFound(id) => {
                ApiError::NotFound(format!("Customer {id} not found"))
            }
            GetCustomerOrdersError::Store(err) => ApiError::Store(err),
        }
    }
}
