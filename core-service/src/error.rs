use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("HTTP error: {0}")]
    Http(#[from] core_http::HttpError),

    #[error("Strava API error: {0}")]
    Strava(#[from] provider_strava::StravaError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
