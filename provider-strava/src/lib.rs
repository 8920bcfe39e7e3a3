//! # Strava Provider
//!
//! Resource clients for the Strava v3 API, built on the shared request
//! pipeline and the access token held by the auth session.
//!
//! ## Overview
//!
//! - [`UploadClient`] checks the processing state of an uploaded activity

pub mod error;
pub mod types;
pub mod uploads;

pub use error::{Result, StravaError};
pub use types::{CurrentUploadStatus, UploadStatus};
pub use uploads::UploadClient;
