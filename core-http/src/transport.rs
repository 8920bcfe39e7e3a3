//! HTTP transport
//!
//! Single funnel for every request made by the core. On each response it
//! records rate-limit headers, publishes a `ResponseReceived` event and
//! classifies the status into content or a soft failure.

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_runtime::events::{CoreEvent, EventBus, HttpEvent, ResponseSnapshot};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{HttpError, Result};
use crate::rate_limit::{RateLimitTracker, LIMIT_HEADER, USAGE_HEADER};

/// Outcome of a request that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// Success status; the raw body decoded as UTF-8
    Content(String),
    /// Any other status; the body is discarded
    EmptyOnError { status: u16 },
}

impl ResponseBody {
    /// Body text, or `""` for a soft failure.
    pub fn text(&self) -> &str {
        match self {
            ResponseBody::Content(body) => body,
            ResponseBody::EmptyOnError { .. } => "",
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ResponseBody::Content(body) => body,
            ResponseBody::EmptyOnError { .. } => String::new(),
        }
    }

    pub fn is_content(&self) -> bool {
        matches!(self, ResponseBody::Content(_))
    }

    /// Status of a soft failure, `None` for content.
    pub fn error_status(&self) -> Option<u16> {
        match self {
            ResponseBody::Content(_) => None,
            ResponseBody::EmptyOnError { status } => Some(*status),
        }
    }
}

/// Request pipeline over an injected [`HttpClient`].
///
/// # Example
///
/// ```ignore
/// use core_http::{HttpTransport, RateLimitTracker};
/// use std::sync::Arc;
///
/// let transport = HttpTransport::new(http_client, Arc::new(RateLimitTracker::new()))
///     .with_event_bus(event_bus.clone());
///
/// let body = transport.get("https://www.strava.com/api/v3/athlete").await?;
/// println!("{}", body.text());
/// ```
#[derive(Clone)]
pub struct HttpTransport {
    client: Arc<dyn HttpClient>,
    rate_limits: Arc<RateLimitTracker>,
    events: Option<EventBus>,
}

impl HttpTransport {
    pub fn new(client: Arc<dyn HttpClient>, rate_limits: Arc<RateLimitTracker>) -> Self {
        Self {
            client,
            rate_limits,
            events: None,
        }
    }

    /// Publish a `ResponseReceived` event for every response.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn rate_limits(&self) -> &Arc<RateLimitTracker> {
        &self.rate_limits
    }

    pub async fn get(&self, url: &str) -> Result<ResponseBody> {
        self.send(HttpMethod::Get, url, None).await
    }

    pub async fn post(&self, url: &str) -> Result<ResponseBody> {
        self.send(HttpMethod::Post, url, None).await
    }

    pub async fn put(&self, url: &str) -> Result<ResponseBody> {
        self.send(HttpMethod::Put, url, None).await
    }

    pub async fn delete(&self, url: &str) -> Result<ResponseBody> {
        self.send(HttpMethod::Delete, url, None).await
    }

    /// Issue a request and classify the response.
    ///
    /// # Errors
    ///
    /// - [`HttpError::InvalidArgument`] for an empty or unparsable URL
    /// - [`HttpError::Network`] when the client fails before a response arrives
    ///
    /// Non-success statuses are not errors: they yield
    /// [`ResponseBody::EmptyOnError`].
    #[instrument(skip(self, url, body), fields(endpoint = tracing::field::Empty))]
    pub async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Bytes>,
    ) -> Result<ResponseBody> {
        let parsed = parse_url(url)?;
        // Query strings may carry credentials
        tracing::Span::current().record(
            "endpoint",
            format!("{}{}", parsed.host_str().unwrap_or_default(), parsed.path()).as_str(),
        );

        let mut request = HttpRequest::new(method, url);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = self.client.execute(request).await.map_err(|e| {
            warn!(error = %e, "HTTP request failed");
            HttpError::from(e)
        })?;

        self.record_rate_limits(&response);
        self.publish(method, url, &response);

        if is_success(method, response.status) {
            debug!(status = response.status, bytes = response.body.len(), "Request succeeded");
            Ok(ResponseBody::Content(
                String::from_utf8_lossy(&response.body).into_owned(),
            ))
        } else {
            warn!(status = response.status, "Request returned non-success status");
            Ok(ResponseBody::EmptyOnError {
                status: response.status,
            })
        }
    }

    fn record_rate_limits(&self, response: &HttpResponse) {
        if let Some(value) = response.header(USAGE_HEADER) {
            if let Err(e) = self.rate_limits.update_usage(value) {
                warn!(error = %e, "Ignoring malformed rate-limit header");
            }
        }

        if let Some(value) = response.header(LIMIT_HEADER) {
            if let Err(e) = self.rate_limits.update_limit(value) {
                warn!(error = %e, "Ignoring malformed rate-limit header");
            }
        }
    }

    fn publish(&self, method: HttpMethod, url: &str, response: &HttpResponse) {
        let Some(events) = &self.events else {
            return;
        };

        let snapshot = ResponseSnapshot {
            method: method.as_str().to_string(),
            url: url.to_string(),
            status: response.status,
            headers: response
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
        };

        // No subscribers is fine
        events
            .emit(CoreEvent::Http(HttpEvent::ResponseReceived(snapshot)))
            .ok();
    }
}

fn parse_url(url: &str) -> Result<Url> {
    if url.trim().is_empty() {
        return Err(HttpError::InvalidArgument("URL must not be empty".to_string()));
    }

    Url::parse(url).map_err(|e| HttpError::InvalidArgument(format!("Invalid URL '{}': {}", url, e)))
}

fn is_success(method: HttpMethod, status: u16) -> bool {
    match method {
        HttpMethod::Delete => status == 200 || status == 204,
        _ => status == 200,
    }
}
