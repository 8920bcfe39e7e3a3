//! # Core Configuration Module
//!
//! Builder-based configuration for the Strava client core.
//!
//! ## Overview
//!
//! `CoreConfig` holds the injected platform bridges and the API endpoints.
//! The builder enforces fail-fast validation so a misconfigured host fails at
//! startup rather than on the first request.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `SettingsStore` - Persisted access token and client id (desktop default: SQLite)
//!
//! ## Optional Dependencies
//!
//! - `AuthorizationBroker` - Drives the browser redirect. Hosts that receive
//!   the redirect through an activation callback leave it unset and call
//!   `complete_exchange` themselves.
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for
//! `HttpClient` and `SettingsStore` are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .http_client(Arc::new(MyHttpClient))
//!     .settings_store(Arc::new(MySettingsStore))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{AuthorizationBroker, HttpClient, SettingsStore};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

use crate::events::DEFAULT_EVENT_BUFFER_SIZE;

pub const DEFAULT_AUTHORIZE_URL: &str = "https://www.strava.com/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://www.strava.com/oauth/token";
pub const DEFAULT_API_BASE: &str = "https://www.strava.com/api/v3";

/// Remote endpoints used by the authorization flow and the resource clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    /// Authorization page the user agent is sent to
    pub authorize_url: String,
    /// Token exchange endpoint
    pub token_url: String,
    /// Base URL for resource requests, without trailing slash
    pub api_base: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl ApiEndpoints {
    /// Point every endpoint at another origin (test servers, proxies).
    pub fn with_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            authorize_url: format!("{}/oauth/authorize", origin),
            token_url: format!("{}/oauth/token", origin),
            api_base: format!("{}/api/v3", origin),
        }
    }

    /// Every endpoint must be an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("authorize_url", &self.authorize_url),
            ("token_url", &self.token_url),
            ("api_base", &self.api_base),
        ] {
            let url = Url::parse(value)
                .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", name, value, e)))?;

            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "{} must use http or https, got '{}'",
                    name,
                    url.scheme()
                )));
            }
        }
        Ok(())
    }
}

/// Core configuration.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// HTTP client used by the transport
    pub http_client: Arc<dyn HttpClient>,

    /// Key-value store for the access token and client id
    pub settings_store: Arc<dyn SettingsStore>,

    /// Browser redirect driver (optional)
    pub auth_broker: Option<Arc<dyn AuthorizationBroker>>,

    /// Remote endpoints
    pub endpoints: ApiEndpoints,

    /// Capacity of the event bus channel
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field(
                "auth_broker",
                &self
                    .auth_broker
                    .as_ref()
                    .map(|_| "AuthorizationBroker { ... }"),
            )
            .field("endpoints", &self.endpoints)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.endpoints.validate()?;

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for API requests. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Mobile: inject the platform HTTP stack (URLSession/OkHttp)."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required to persist the access token. \
                 Desktop: enable the 'desktop-shims' feature to use the default SqliteSettingsStore. \
                 Mobile: inject platform-native settings (UserDefaults/DataStore)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new()
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn default_settings_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("strava-client")
        .join("settings.db")
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Handle, Runtime};

    let path = path.unwrap_or_else(default_settings_path);

    let init_store = |path: PathBuf| -> Result<_> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default settings store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    // block_on is not allowed on a runtime thread
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default SettingsStore".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    auth_broker: Option<Arc<dyn AuthorizationBroker>>,
    endpoints: Option<ApiEndpoints>,
    settings_path: Option<PathBuf>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn auth_broker(mut self, broker: Arc<dyn AuthorizationBroker>) -> Self {
        self.auth_broker = Some(broker);
        self
    }

    pub fn endpoints(mut self, endpoints: ApiEndpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Location of the default SQLite settings file.
    ///
    /// Only used when no settings store is injected and `desktop-shims` is on.
    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge is absent and no
    ///   platform default is available
    /// - [`Error::Config`] when an endpoint or the buffer size is invalid
    pub fn build(self) -> Result<CoreConfig> {
        let endpoints = self.endpoints.unwrap_or_default();
        endpoints.validate()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(self.settings_path)?,
        };

        let config = CoreConfig {
            http_client,
            settings_store,
            auth_broker: self.auth_broker,
            endpoints,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
