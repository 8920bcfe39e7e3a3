//! Upload status client

use crate::error::{Result, StravaError};
use crate::types::UploadStatus;
use core_auth::AuthSession;
use core_http::{unmarshal, HttpTransport, ResponseBody};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Client for the `/uploads` resource.
///
/// Requests are authorized with the access token currently held by the
/// session, passed as the `access_token` query parameter.
pub struct UploadClient {
    transport: HttpTransport,
    session: Arc<AuthSession>,
    api_base: String,
}

impl UploadClient {
    pub fn new(transport: HttpTransport, session: Arc<AuthSession>, api_base: impl Into<String>) -> Self {
        Self {
            transport,
            session,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the processing state of an upload.
    ///
    /// # Errors
    ///
    /// - [`StravaError::NotAuthenticated`] when the session has no token
    /// - [`StravaError::ApiError`] when Strava answers with a non-success status
    /// - [`StravaError::ParseError`] when the body is not an upload record
    #[instrument(skip(self))]
    pub async fn check_upload_status(&self, upload_id: i64) -> Result<UploadStatus> {
        let token = self
            .session
            .access_token()
            .await?
            .ok_or(StravaError::NotAuthenticated)?;

        let url = format!(
            "{}/uploads/{}?access_token={}",
            self.api_base,
            upload_id,
            token.as_str()
        );

        let body = match self.transport.get(&url).await? {
            ResponseBody::Content(body) => body,
            ResponseBody::EmptyOnError { status } => {
                warn!(status, "Upload status request failed");
                return Err(StravaError::ApiError { status });
            }
        };

        let upload: UploadStatus = unmarshal(&body)?;
        debug!(status = %upload.status, "Fetched upload status");
        Ok(upload)
    }
}
