//! Strava API response types

use serde::{Deserialize, Serialize};

const STATUS_PROCESSING: &str = "Your activity is still being processed.";
const STATUS_DELETED: &str = "The created activity has been deleted.";
const STATUS_ERROR: &str = "There was an error processing your activity.";

/// Processing state of an upload, derived from the status sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrentUploadStatus {
    Processing,
    Deleted,
    Error,
    Ready,
}

/// Upload resource
///
/// See: https://developers.strava.com/docs/reference/#api-models-Upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadStatus {
    /// Upload id assigned by Strava
    pub id: i64,

    /// External id of the uploaded file
    #[serde(default)]
    pub external_id: Option<String>,

    /// Error message, if processing failed
    #[serde(default)]
    pub error: Option<String>,

    /// Human-readable status sentence
    #[serde(default)]
    pub status: String,

    /// Id of the created activity once processing is done
    #[serde(default)]
    pub activity_id: Option<i64>,
}

impl UploadStatus {
    /// Map the status sentence to a [`CurrentUploadStatus`].
    ///
    /// Any sentence other than the three known ones means the activity is
    /// ready.
    pub fn current_status(&self) -> CurrentUploadStatus {
        match self.status.as_str() {
            STATUS_PROCESSING => CurrentUploadStatus::Processing,
            STATUS_DELETED => CurrentUploadStatus::Deleted,
            STATUS_ERROR => CurrentUploadStatus::Error,
            _ => CurrentUploadStatus::Ready,
        }
    }
}
