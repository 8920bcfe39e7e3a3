//! Error types for the request pipeline

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Request pipeline errors
///
/// Non-success status codes are deliberately absent: they surface as
/// [`ResponseBody::EmptyOnError`](crate::ResponseBody::EmptyOnError).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// Caller passed an empty or unparsable URL
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// DNS, TLS, connect or timeout failure reported by the HTTP client
    #[error("Network error: {0}")]
    Network(String),

    /// A rate-limit header was not a `short,long` integer pair
    #[error("Malformed {header} header: '{value}'")]
    MalformedHeader { header: String, value: String },

    /// Response body could not be deserialized into the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<BridgeError> for HttpError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Network(msg) => HttpError::Network(msg),
            other => HttpError::Network(other.to_string()),
        }
    }
}

/// Result type for request pipeline operations
pub type Result<T> = std::result::Result<T, HttpError>;
