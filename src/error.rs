//! Error types for the key-value server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == KV Error Enum ==
/// Unified error type for request handling.
#[derive(Error, Debug)]
pub enum KvError {
    /// Key absent from the backing store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Malformed request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The backing store failed or could not be reached
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The worker pool no longer accepts tasks
    #[error("Server is shutting down")]
    ShuttingDown,

    /// Unexpected failure inside a task
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Store Error Enum ==
/// Failures reported by a backing store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store could not be reached or refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for KvError {
    fn from(err: StoreError) -> Self {
        KvError::StoreUnavailable(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for KvError {
    fn into_response(self) -> Response {
        let status = match &self {
            KvError::NotFound(_) => StatusCode::NOT_FOUND,
            KvError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            KvError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            KvError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            KvError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Aliases ==
/// Convenience Result type for request handling.
pub type Result<T> = std::result::Result<T, KvError>;

/// Result type returned by backing stores.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
