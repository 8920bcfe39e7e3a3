//! Authorization Session
//!
//! Holds the state of the authorization-code flow for one application
//! instance. The access token and client id survive restarts through the
//! injected [`SettingsStore`]; everything else lives in memory only.
//!
//! ## Persistence rules
//!
//! - Reading a persisted field that is unset in memory hydrates it from the
//!   store once. A missing key reads as `None`.
//! - Writing a persisted field hydrates first, then compares. An unchanged
//!   value performs no storage write.
//! - Each persisted field has its own lock, held across the whole
//!   hydrate-compare-write sequence.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{AccessToken, AuthSession};
//! use std::sync::Arc;
//! # use bridge_traits::storage::SettingsStore;
//! # async fn example(store: Arc<dyn SettingsStore>) -> core_auth::Result<()> {
//! let session = Arc::new(AuthSession::new(store));
//!
//! session.set_access_token(AccessToken::new("83ebeabd")).await?;
//! assert!(session.access_token().await?.is_some());
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::types::{AccessToken, Scope};
use bridge_traits::storage::SettingsStore;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "AccessToken";
/// Storage key of the client id
pub const CLIENT_ID_KEY: &str = "clientId";

#[derive(Default)]
struct PersistedField {
    value: Option<String>,
    hydrated: bool,
}

#[derive(Default)]
struct Transient {
    client_secret: Option<String>,
    callback_uri: Option<String>,
    scope: Option<Scope>,
    auth_code: Option<String>,
}

/// Authorization state shared by the exchanger and the resource clients.
pub struct AuthSession {
    store: Arc<dyn SettingsStore>,
    access_token: Mutex<PersistedField>,
    client_id: Mutex<PersistedField>,
    transient: RwLock<Transient>,
}

impl AuthSession {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        debug!("Initializing AuthSession");
        Self {
            store,
            access_token: Mutex::new(PersistedField::default()),
            client_id: Mutex::new(PersistedField::default()),
            transient: RwLock::new(Transient::default()),
        }
    }

    /// Current access token, hydrated from storage on first use.
    pub async fn access_token(&self) -> Result<Option<AccessToken>> {
        let value = self.read(&self.access_token, ACCESS_TOKEN_KEY).await?;
        Ok(value.map(AccessToken::from))
    }

    /// Store a new access token.
    ///
    /// Returns `true` when the value changed and was persisted.
    pub async fn set_access_token(&self, token: AccessToken) -> Result<bool> {
        self.write(&self.access_token, ACCESS_TOKEN_KEY, token.into_inner())
            .await
    }

    /// Drop the access token from memory and storage (local sign-out).
    pub async fn forget_access_token(&self) -> Result<()> {
        let mut field = self.access_token.lock().await;

        self.store.delete(ACCESS_TOKEN_KEY).await.map_err(|e| {
            warn!(error = %e, "Failed to delete persisted access token");
            e
        })?;

        field.value = None;
        field.hydrated = true;

        debug!("Access token forgotten");
        Ok(())
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.access_token().await?.is_some())
    }

    pub async fn client_id(&self) -> Result<Option<String>> {
        self.read(&self.client_id, CLIENT_ID_KEY).await
    }

    pub async fn set_client_id(&self, client_id: &str) -> Result<bool> {
        self.write(&self.client_id, CLIENT_ID_KEY, client_id.to_string())
            .await
    }

    pub fn client_secret(&self) -> Option<String> {
        self.transient().client_secret.clone()
    }

    pub fn set_client_secret(&self, client_secret: &str) {
        self.transient_mut().client_secret = Some(client_secret.to_string());
    }

    pub fn callback_uri(&self) -> Option<String> {
        self.transient().callback_uri.clone()
    }

    pub fn set_callback_uri(&self, callback_uri: &str) {
        self.transient_mut().callback_uri = Some(callback_uri.to_string());
    }

    pub fn scope(&self) -> Option<Scope> {
        self.transient().scope
    }

    pub fn set_scope(&self, scope: Scope) {
        self.transient_mut().scope = Some(scope);
    }

    /// Last authorization code extracted from a redirect.
    pub fn auth_code(&self) -> Option<String> {
        self.transient().auth_code.clone()
    }

    pub fn set_auth_code(&self, code: &str) {
        self.transient_mut().auth_code = Some(code.to_string());
    }

    fn transient(&self) -> std::sync::RwLockReadGuard<'_, Transient> {
        self.transient.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn transient_mut(&self) -> std::sync::RwLockWriteGuard<'_, Transient> {
        self.transient.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn hydrate(&self, field: &mut PersistedField, key: &str) -> Result<()> {
        if field.hydrated || field.value.is_some() {
            return Ok(());
        }

        field.value = self.store.get_string(key).await?;
        field.hydrated = true;

        debug!(key = key, found = field.value.is_some(), "Hydrated session field");
        Ok(())
    }

    async fn read(&self, field: &Mutex<PersistedField>, key: &str) -> Result<Option<String>> {
        let mut field = field.lock().await;
        self.hydrate(&mut field, key).await?;
        Ok(field.value.clone())
    }

    async fn write(&self, field: &Mutex<PersistedField>, key: &str, value: String) -> Result<bool> {
        let mut field = field.lock().await;
        self.hydrate(&mut field, key).await?;

        if field.value.as_deref() == Some(value.as_str()) {
            return Ok(false);
        }

        self.store.set_string(key, &value).await.map_err(|e| {
            warn!(key = key, error = %e, "Failed to persist session field");
            e
        })?;

        field.value = Some(value);
        field.hydrated = true;

        debug!(key = key, "Persisted session field");
        Ok(true)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transient = self.transient();
        f.debug_struct("AuthSession")
            .field("callback_uri", &transient.callback_uri)
            .field("scope", &transient.scope)
            .field("client_secret", &transient.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("auth_code", &transient.auth_code.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}
