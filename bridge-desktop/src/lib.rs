//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using SQLite-backed key-value store
//! - `AuthorizationBroker` using a loopback HTTP listener
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{LoopbackAuthBroker, ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let settings = SqliteSettingsStore::new("settings.db".into()).await?;
//!     let broker = LoopbackAuthBroker::for_callback("http://127.0.0.1:8080/callback").await?;
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod broker;
mod http;
mod settings;

pub use broker::{LoopbackAuthBroker, UrlLauncher};
pub use http::ReqwestHttpClient;
pub use settings::SqliteSettingsStore;
