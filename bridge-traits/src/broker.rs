//! Authorization Broker Abstraction
//!
//! The redirect-based authorization step needs a user agent: the host opens
//! the provider's authorization page, the user approves, and the provider
//! redirects to the registered callback URI with a temporary code. How that
//! happens is platform specific (system browser + loopback listener on
//! desktop, an in-app web view on mobile), so the core only sees this trait.
//!
//! Platforms that deliver the redirect through an app-activation callback
//! instead of an awaited call skip the broker entirely and hand the redirect
//! text straight to the token exchanger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Outcome reported by an authorization broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrokerStatus {
    /// The redirect arrived; `response_data` holds the full redirect URL.
    Success,
    /// The provider answered the authorization request with an HTTP error.
    ErrorHttp,
    /// The user dismissed or denied the authorization.
    UserCancel,
}

impl fmt::Display for BrokerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BrokerStatus::Success => "Success",
            BrokerStatus::ErrorHttp => "ErrorHttp",
            BrokerStatus::UserCancel => "UserCancel",
        };
        f.write_str(name)
    }
}

/// Result of a completed broker interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerResult {
    pub status: BrokerStatus,
    /// Redirect URL (or other payload) that carries the authorization code
    pub response_data: String,
    /// Provider supplied error detail when `status` is not `Success`
    pub error_detail: Option<String>,
}

impl BrokerResult {
    pub fn success(response_data: impl Into<String>) -> Self {
        Self {
            status: BrokerStatus::Success,
            response_data: response_data.into(),
            error_detail: None,
        }
    }

    pub fn http_error(detail: impl Into<String>) -> Self {
        Self {
            status: BrokerStatus::ErrorHttp,
            response_data: String::new(),
            error_detail: Some(detail.into()),
        }
    }

    pub fn cancelled(detail: Option<String>) -> Self {
        Self {
            status: BrokerStatus::UserCancel,
            response_data: String::new(),
            error_detail: detail,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == BrokerStatus::Success
    }
}

/// Drives the user-facing part of the authorization-code flow.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::broker::AuthorizationBroker;
///
/// async fn authorize(broker: &dyn AuthorizationBroker, url: &str) -> Result<String> {
///     let result = broker.authenticate(url, "http://localhost:8080/callback").await?;
///     Ok(result.response_data)
/// }
/// ```
#[async_trait]
pub trait AuthorizationBroker: Send + Sync {
    /// Present `start_url` to the user and wait until the provider redirects
    /// to `callback_uri`.
    ///
    /// Provider-side failures are reported through [`BrokerResult::status`];
    /// `Err` is reserved for failures of the broker itself (for example the
    /// loopback listener could not be bound).
    async fn authenticate(&self, start_url: &str, callback_uri: &str) -> Result<BrokerResult>;
}
