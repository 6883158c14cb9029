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

// == Kv Error Enum ==
/// Unified error type for the store, cache, transaction log and transport.
#[derive(Error, Debug)]
pub enum KvError {
    /// Key absent from both the cache and the backing store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Cache constructed with a zero capacity
    #[error("Invalid cache capacity {0}: capacity must be > 0")]
    CapacityInvalid(usize),

    /// Replay found a sequence number that is not the successor of the previous one
    #[error("Transaction out of sequence order at line {line}: {found} does not follow {previous}")]
    OutOfSequence { line: usize, previous: u64, found: u64 },

    /// Replay found a line that cannot be decoded
    #[error("Malformed transaction log record at line {line}: {reason}")]
    MalformedEvent { line: usize, reason: String },

    /// Durable medium read or write failure
    #[error("Transaction log I/O error: {0}")]
    LogIo(#[from] std::io::Error),

    /// The log writer has failed or stopped; mutations can no longer be recorded
    #[error("Transaction log unavailable: {0}")]
    LogUnavailable(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request rejected by the throttle
    #[error("Too many requests")]
    TooManyRequests,

    /// Internal cache corruption, never expected while the cache invariants hold
    #[error("Invalid cache state: {0}")]
    InvalidState(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for KvError {
    fn into_response(self) -> Response {
        let status = match &self {
            KvError::NotFound(_) => StatusCode::NOT_FOUND,
            KvError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            KvError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the key-value server.
pub type Result<T> = std::result::Result<T, KvError>;
