//! Authorization-code Exchange
//!
//! Drives the redirect-based flow:
//!
//! ```text
//! build_authorization_url ──> user agent / broker ──> redirect "...code=XYZ"
//!                                                            │
//!          AuthSession <── TokenReceived <── POST token <── complete_exchange
//! ```
//!
//! `CodeReceived` is published before the token request goes out and
//! `TokenReceived` only after the token has been persisted on the session.
//!
//! Hosts whose platform delivers the redirect through an activation callback
//! call [`TokenExchanger::build_authorization_url`], open the URL themselves
//! and later hand the redirect to [`TokenExchanger::complete_exchange`].

use crate::error::{AuthError, Result};
use crate::session::AuthSession;
use crate::types::{AccessToken, Scope, TokenResponse};
use bridge_traits::broker::{AuthorizationBroker, BrokerStatus};
use core_http::{unmarshal, HttpTransport, ResponseBody};
use core_runtime::config::ApiEndpoints;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const CODE_MARKER: &str = "code=";

/// Build the URL the user agent must open to authorize the application.
///
/// Parameters are appended verbatim, in a fixed order.
///
/// # Examples
///
/// ```
/// use core_auth::{exchanger::authorization_url, Scope};
///
/// let url = authorization_url(
///     "https://www.strava.com/oauth/authorize",
///     "3005",
///     "http://cb",
///     Scope::Public,
/// );
/// assert_eq!(
///     url,
///     "https://www.strava.com/oauth/authorize?client_id=3005&response_type=code\
///      &redirect_uri=http://cb&scope=public&state=private&approval_prompt=auto"
/// );
/// ```
pub fn authorization_url(
    authorize_url: &str,
    client_id: &str,
    callback_uri: &str,
    scope: Scope,
) -> String {
    format!(
        "{}?client_id={}&response_type=code&redirect_uri={}&scope={}&state=private&approval_prompt=auto",
        authorize_url,
        client_id,
        callback_uri,
        scope.as_str()
    )
}

/// Pull the temporary code out of a redirect URL or query string.
///
/// The code runs from the `code=` marker up to the next `&`, `#` or
/// whitespace.
pub fn extract_code(redirect: &str) -> Result<String> {
    let start = redirect
        .find(CODE_MARKER)
        .map(|idx| idx + CODE_MARKER.len())
        .ok_or_else(|| {
            AuthError::MalformedRedirect("redirect does not contain an authorization code".into())
        })?;

    let code: String = redirect[start..]
        .chars()
        .take_while(|c| !matches!(c, '&' | '#') && !c.is_whitespace())
        .collect();

    if code.is_empty() {
        return Err(AuthError::MalformedRedirect(
            "authorization code is empty".to_string(),
        ));
    }

    Ok(code)
}

/// Exchanges authorization codes for access tokens.
pub struct TokenExchanger {
    transport: HttpTransport,
    session: Arc<AuthSession>,
    endpoints: ApiEndpoints,
    events: Option<EventBus>,
    broker: Option<Arc<dyn AuthorizationBroker>>,
}

impl TokenExchanger {
    pub fn new(transport: HttpTransport, session: Arc<AuthSession>, endpoints: ApiEndpoints) -> Self {
        Self {
            transport,
            session,
            endpoints,
            events: None,
            broker: None,
        }
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_broker(mut self, broker: Arc<dyn AuthorizationBroker>) -> Self {
        self.broker = Some(broker);
        self
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    fn emit(&self, event: AuthEvent) {
        if let Some(events) = &self.events {
            events.emit(CoreEvent::Auth(event)).ok();
        }
    }

    fn fail<T>(&self, error: AuthError) -> Result<T> {
        warn!(error = %error, "Authorization failed");
        self.emit(AuthEvent::AuthError {
            message: error.to_string(),
        });
        Err(error)
    }

    /// Build the authorization URL and record the client credentials on the
    /// session.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidArgument`] for an empty client id or callback URI;
    /// [`AuthError::Storage`] if the client id cannot be persisted.
    #[instrument(skip(self, client_secret))]
    pub async fn build_authorization_url(
        &self,
        client_id: &str,
        client_secret: &str,
        callback_uri: &str,
        scope: Scope,
    ) -> Result<String> {
        if client_id.trim().is_empty() {
            return Err(AuthError::InvalidArgument(
                "client id must not be empty".to_string(),
            ));
        }
        if callback_uri.trim().is_empty() {
            return Err(AuthError::InvalidArgument(
                "callback URI must not be empty".to_string(),
            ));
        }

        let url = authorization_url(&self.endpoints.authorize_url, client_id, callback_uri, scope);

        self.session.set_client_id(client_id).await?;
        self.session.set_client_secret(client_secret);
        self.session.set_callback_uri(callback_uri);
        self.session.set_scope(scope);

        debug!("Built authorization URL");
        self.emit(AuthEvent::AuthorizationStarted { url: url.clone() });

        Ok(url)
    }

    /// Run the whole flow through the configured authorization broker.
    ///
    /// # Errors
    ///
    /// - [`AuthError::BrokerUnavailable`] when no broker is configured
    /// - [`AuthError::AuthBroker`] when the broker reports an HTTP error, a
    ///   cancellation, or fails itself
    /// - any error of [`complete_exchange`](Self::complete_exchange)
    #[instrument(skip(self, client_secret))]
    pub async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
        callback_uri: &str,
        scope: Scope,
    ) -> Result<AccessToken> {
        let Some(broker) = self.broker.as_ref() else {
            return self.fail(AuthError::BrokerUnavailable);
        };

        let url = self
            .build_authorization_url(client_id, client_secret, callback_uri, scope)
            .await?;

        let result = match broker.authenticate(&url, callback_uri).await {
            Ok(result) => result,
            Err(e) => {
                return self.fail(AuthError::AuthBroker(format!(
                    "Authorization broker failed: {}",
                    e
                )))
            }
        };

        match result.status {
            BrokerStatus::Success => self.complete_exchange(&result.response_data).await,
            BrokerStatus::ErrorHttp => self.fail(AuthError::AuthBroker(format!(
                "HTTP Error returned by authorization broker: {}",
                result.error_detail.unwrap_or_default()
            ))),
            status => self.fail(AuthError::AuthBroker(format!(
                "Error returned by authorization broker: {}",
                status
            ))),
        }
    }

    /// Exchange the code carried by `redirect` for an access token.
    ///
    /// The client id comes from the session (persisted, so it survives a
    /// restart between the two halves of the flow); the client secret must
    /// have been recorded by `build_authorization_url` in this process.
    #[instrument(skip_all)]
    pub async fn complete_exchange(&self, redirect: &str) -> Result<AccessToken> {
        match self.exchange(redirect).await {
            Ok(token) => Ok(token),
            Err(e) => self.fail(e),
        }
    }

    async fn exchange(&self, redirect: &str) -> Result<AccessToken> {
        let code = extract_code(redirect)?;
        self.session.set_auth_code(&code);
        self.emit(AuthEvent::CodeReceived { code: code.clone() });

        let client_id = self.session.client_id().await?.ok_or_else(|| {
            AuthError::InvalidArgument("client id is not set on the session".to_string())
        })?;
        let client_secret = self.session.client_secret().ok_or_else(|| {
            AuthError::InvalidArgument("client secret is not set on the session".to_string())
        })?;

        let url = format!(
            "{}?client_id={}&client_secret={}&code={}",
            self.endpoints.token_url, client_id, client_secret, code
        );

        let body = match self.transport.post(&url).await? {
            ResponseBody::Content(body) => body,
            ResponseBody::EmptyOnError { status } => {
                return Err(AuthError::MalformedResponse(format!(
                    "token endpoint returned status {}",
                    status
                )))
            }
        };

        let response: TokenResponse = unmarshal(&body)?;
        if response.access_token.is_empty() {
            return Err(AuthError::MalformedResponse(
                "access_token is empty".to_string(),
            ));
        }

        let token = AccessToken::new(response.access_token);
        self.session.set_access_token(token.clone()).await?;

        info!("Access token received");
        self.emit(AuthEvent::TokenReceived {
            token: token.as_str().to_string(),
        });

        Ok(token)
    }
}
