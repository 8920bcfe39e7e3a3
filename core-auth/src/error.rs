use bridge_traits::error::BridgeError;
use core_http::HttpError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The authorization broker reported a provider-side failure
    #[error("{0}")]
    AuthBroker(String),

    #[error("No authorization broker configured")]
    BrokerUnavailable,

    #[error("Malformed redirect: {0}")]
    MalformedRedirect(String),

    #[error("Malformed token response: {0}")]
    MalformedResponse(String),

    #[error("Settings storage failed: {0}")]
    Storage(String),
}

impl From<HttpError> for AuthError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::InvalidArgument(msg) => AuthError::InvalidArgument(msg),
            HttpError::Network(msg) => AuthError::Network(msg),
            HttpError::MalformedResponse(msg) => AuthError::MalformedResponse(msg),
            other @ HttpError::MalformedHeader { .. } => {
                AuthError::MalformedResponse(other.to_string())
            }
        }
    }
}

impl From<BridgeError> for AuthError {
    fn from(error: BridgeError) -> Self {
        AuthError::Storage(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
