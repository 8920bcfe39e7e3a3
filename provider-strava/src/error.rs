//! Error types for the Strava provider

use core_auth::AuthError;
use core_http::HttpError;
use thiserror::Error;

/// Strava provider errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StravaError {
    /// No access token is available on the session
    #[error("Not authenticated: no access token on the session")]
    NotAuthenticated,

    /// The API answered with a non-success status
    #[error("Strava API error (status {status})")]
    ApiError { status: u16 },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Transport or session failure
    #[error("Request failed: {0}")]
    Http(String),
}

/// Result type for Strava operations
pub type Result<T> = std::result::Result<T, StravaError>;

impl From<HttpError> for StravaError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::MalformedResponse(msg) => StravaError::ParseError(msg),
            other => StravaError::Http(other.to_string()),
        }
    }
}

impl From<AuthError> for StravaError {
    fn from(error: AuthError) -> Self {
        StravaError::Http(error.to_string())
    }
}
