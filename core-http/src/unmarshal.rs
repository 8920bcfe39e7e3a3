//! JSON deserialization shared by every consumer of response bodies.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{HttpError, Result};

/// Deserialize a response body into `T`.
///
/// Failures are reported as [`HttpError::MalformedResponse`] so they stay
/// distinguishable from transport failures.
pub fn unmarshal<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| {
        warn!(error = %e, "Failed to deserialize response body");
        HttpError::MalformedResponse(e.to_string())
    })
}
