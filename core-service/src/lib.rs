//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, settings,
//! authorization broker) into the Strava client core. Desktop apps typically
//! enable the `desktop-shims` feature, which lets [`CoreConfig`] fall back to
//! the adapters from `bridge-desktop`.
//!
//! ```no_run
//! # async fn example() -> core_service::Result<()> {
//! use core_service::{CoreConfig, Scope, StravaService};
//!
//! let service = StravaService::new(CoreConfig::builder().build()?);
//! let url = service
//!     .build_authorization_url("3005", "secret", "http://localhost:8080/", Scope::Full)
//!     .await?;
//! // open `url`, capture the redirect, then:
//! let token = service.complete_exchange("http://localhost:8080/?code=abc").await?;
//! # let _ = (url, token);
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use error::{CoreError, Result};

pub use core_auth::{AccessToken, AuthSession, Scope, TokenExchanger};
pub use core_http::{HttpTransport, RateLimitSnapshot, RateLimitTracker};
pub use core_runtime::config::{ApiEndpoints, CoreConfig};
pub use core_runtime::events::{AuthEvent, CoreEvent, EventBus, EventStream, HttpEvent};
pub use provider_strava::{CurrentUploadStatus, UploadClient, UploadStatus};

use std::sync::Arc;
use tracing::info;

/// Version of the client library as `major.minor.patch`.
pub fn framework_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Primary façade exposed to host applications.
///
/// All components share one event bus, one rate-limit tracker and one
/// session.
#[derive(Clone)]
pub struct StravaService {
    events: EventBus,
    transport: HttpTransport,
    session: Arc<AuthSession>,
    exchanger: Arc<TokenExchanger>,
    uploads: Arc<UploadClient>,
}

impl StravaService {
    /// Create a new service from a validated configuration.
    pub fn new(config: CoreConfig) -> Self {
        let events = EventBus::new(config.event_buffer_size);
        let rate_limits = Arc::new(RateLimitTracker::new());
        let transport =
            HttpTransport::new(config.http_client.clone(), rate_limits).with_event_bus(events.clone());
        let session = Arc::new(AuthSession::new(config.settings_store.clone()));

        let mut exchanger =
            TokenExchanger::new(transport.clone(), session.clone(), config.endpoints.clone())
                .with_event_bus(events.clone());
        if let Some(broker) = config.auth_broker.clone() {
            exchanger = exchanger.with_broker(broker);
        }

        let uploads = UploadClient::new(
            transport.clone(),
            session.clone(),
            config.endpoints.api_base.clone(),
        );

        info!(version = framework_version(), "Strava service initialized");

        Self {
            events,
            transport,
            session,
            exchanger: Arc::new(exchanger),
            uploads: Arc::new(uploads),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to every event published by the service.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn exchanger(&self) -> &TokenExchanger {
        &self.exchanger
    }

    pub fn uploads(&self) -> &UploadClient {
        &self.uploads
    }

    /// Last rate-limit counters reported by Strava.
    pub fn rate_limits(&self) -> RateLimitSnapshot {
        self.transport.rate_limits().snapshot()
    }

    pub async fn build_authorization_url(
        &self,
        client_id: &str,
        client_secret: &str,
        callback_uri: &str,
        scope: Scope,
    ) -> Result<String> {
        Ok(self
            .exchanger
            .build_authorization_url(client_id, client_secret, callback_uri, scope)
            .await?)
    }

    pub async fn complete_exchange(&self, redirect: &str) -> Result<AccessToken> {
        Ok(self.exchanger.complete_exchange(redirect).await?)
    }

    /// Run the full authorization flow through the configured broker.
    pub async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
        callback_uri: &str,
        scope: Scope,
    ) -> Result<AccessToken> {
        Ok(self
            .exchanger
            .request_token(client_id, client_secret, callback_uri, scope)
            .await?)
    }

    pub async fn check_upload_status(&self, upload_id: i64) -> Result<UploadStatus> {
        Ok(self.uploads.check_upload_status(upload_id).await?)
    }
}
