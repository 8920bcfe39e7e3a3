//! Integration tests for the authorization-code exchange

use async_trait::async_trait;
use bridge_traits::broker::{AuthorizationBroker, BrokerResult};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::storage::SettingsStore;
use core_auth::{AccessToken, AuthError, AuthSession, Scope, TokenExchanger, ACCESS_TOKEN_KEY};
use core_http::{HttpTransport, RateLimitTracker};
use core_runtime::config::ApiEndpoints;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus, EventStream};
use mockall::mock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const TOKEN_BODY: &str =
    r#"{"token_type":"Bearer","access_token":"83ebeabdec09f6670863766f792ead24d61fe3f9","athlete":{"id":227615}}"#;
const TOKEN: &str = "83ebeabdec09f6670863766f792ead24d61fe3f9";

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

/// Settings store that counts writes and records which auth events had
/// already been published when each write happened.
#[derive(Default)]
struct RecordingStore {
    values: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    observer: Mutex<Option<EventStream>>,
    seen_at_write: Mutex<Vec<CoreEvent>>,
}

impl RecordingStore {
    fn watch(&self, bus: &EventBus) {
        *self.observer.lock().unwrap() = Some(EventStream::new(bus.subscribe()));
    }

    fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl SettingsStore for RecordingStore {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(stream) = self.observer.lock().unwrap().as_mut() {
            while let Some(Ok(event)) = stream.try_recv() {
                self.seen_at_write.lock().unwrap().push(event);
            }
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.value(key))
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.values.lock().unwrap().keys().cloned().collect())
    }

    async fn clear_all(&self) -> BridgeResult<()> {
        self.values.lock().unwrap().clear();
        Ok(())
    }
}

/// Token endpoint stub that records the auth events already published when
/// the request arrives.
struct TokenEndpoint {
    response: HttpResponse,
    requests: Mutex<Vec<HttpRequest>>,
    observer: Mutex<EventStream>,
    seen_at_request: Mutex<Vec<CoreEvent>>,
}

impl TokenEndpoint {
    fn new(bus: &EventBus, response: HttpResponse) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
            observer: Mutex::new(EventStream::new(bus.subscribe())),
            seen_at_request: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HttpClient for TokenEndpoint {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        {
            let mut observer = self.observer.lock().unwrap();
            while let Some(Ok(event)) = observer.try_recv() {
                self.seen_at_request.lock().unwrap().push(event);
            }
        }
        self.requests.lock().unwrap().push(request);
        Ok(self.response.clone())
    }
}

struct StubBroker(BrokerResult);

#[async_trait]
impl AuthorizationBroker for StubBroker {
    async fn authenticate(&self, start_url: &str, callback_uri: &str) -> BridgeResult<BrokerResult> {
        assert!(start_url.starts_with("https://www.strava.com/oauth/authorize?client_id=3005"));
        assert_eq!(callback_uri, "http://cb");
        Ok(self.0.clone())
    }
}

struct Harness {
    bus: EventBus,
    store: Arc<RecordingStore>,
    session: Arc<AuthSession>,
}

impl Harness {
    fn new() -> Self {
        let bus = EventBus::new(32);
        let store = Arc::new(RecordingStore::default());
        let session = Arc::new(AuthSession::new(store.clone()));
        Self {
            bus,
            store,
            session,
        }
    }

    fn exchanger(&self, client: Arc<dyn HttpClient>) -> TokenExchanger {
        let transport = HttpTransport::new(client, Arc::new(RateLimitTracker::new()))
            .with_event_bus(self.bus.clone());
        TokenExchanger::new(transport, self.session.clone(), ApiEndpoints::default())
            .with_event_bus(self.bus.clone())
    }
}

fn auth_events(events: &[CoreEvent]) -> Vec<AuthEvent> {
    events
        .iter()
        .filter_map(|event| match event {
            CoreEvent::Auth(auth) => Some(auth.clone()),
            _ => None,
        })
        .collect()
}

fn drain(stream: &mut EventStream) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Some(Ok(event)) = stream.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn authorization_url_contains_expected_query() {
    let harness = Harness::new();
    let mut client = MockHttpClient::new();
    client.expect_execute().never();
    let exchanger = harness.exchanger(Arc::new(client));

    let url = exchanger
        .build_authorization_url("3005", "secret", "http://cb", Scope::Public)
        .await
        .unwrap();

    assert!(url.starts_with("https://www.strava.com/oauth/authorize?"));
    assert!(url.contains(
        "client_id=3005&response_type=code&redirect_uri=http://cb&scope=public&state=private&approval_prompt=auto"
    ));

    assert_eq!(
        harness.session.client_id().await.unwrap().as_deref(),
        Some("3005")
    );
    assert_eq!(harness.session.client_secret().as_deref(), Some("secret"));
    assert_eq!(harness.session.scope(), Some(Scope::Public));
}

#[tokio::test]
async fn authorization_url_rejects_empty_client_id() {
    let harness = Harness::new();
    let exchanger = harness.exchanger(Arc::new(MockHttpClient::new()));

    let result = exchanger
        .build_authorization_url("", "secret", "http://cb", Scope::Full)
        .await;

    assert!(matches!(result, Err(AuthError::InvalidArgument(_))));
}

#[tokio::test]
async fn complete_exchange_posts_code_and_stores_token() {
    let harness = Harness::new();
    let endpoint = Arc::new(TokenEndpoint::new(
        &harness.bus,
        HttpResponse::new(200, TOKEN_BODY),
    ));
    let exchanger = harness.exchanger(endpoint.clone());

    exchanger
        .build_authorization_url("3005", "secret", "http://cb", Scope::Full)
        .await
        .unwrap();
    let token = exchanger
        .complete_exchange("http://cb/?state=private&code=ABC123")
        .await
        .unwrap();

    assert_eq!(token, AccessToken::new(TOKEN));
    assert_eq!(
        harness.session.access_token().await.unwrap(),
        Some(AccessToken::new(TOKEN))
    );
    assert_eq!(harness.session.auth_code().as_deref(), Some("ABC123"));
    assert_eq!(harness.store.value(ACCESS_TOKEN_KEY).as_deref(), Some(TOKEN));

    let requests = endpoint.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(
        requests[0].url,
        "https://www.strava.com/oauth/token?client_id=3005&client_secret=secret&code=ABC123"
    );
}

#[tokio::test]
async fn code_received_is_published_before_the_token_request() {
    let harness = Harness::new();
    let endpoint = Arc::new(TokenEndpoint::new(
        &harness.bus,
        HttpResponse::new(200, TOKEN_BODY),
    ));
    let exchanger = harness.exchanger(endpoint.clone());

    exchanger
        .build_authorization_url("3005", "secret", "http://cb", Scope::Full)
        .await
        .unwrap();
    exchanger.complete_exchange("code=ABC123").await.unwrap();

    let seen = auth_events(&endpoint.seen_at_request.lock().unwrap());
    assert!(seen.contains(&AuthEvent::CodeReceived {
        code: "ABC123".to_string()
    }));
    assert!(!seen
        .iter()
        .any(|event| matches!(event, AuthEvent::TokenReceived { .. })));
}

#[tokio::test]
async fn token_received_fires_once_after_storage() {
    let harness = Harness::new();
    let mut stream = EventStream::new(harness.bus.subscribe());
    let endpoint = Arc::new(TokenEndpoint::new(
        &harness.bus,
        HttpResponse::new(200, TOKEN_BODY),
    ));
    let exchanger = harness.exchanger(endpoint);

    exchanger
        .build_authorization_url("3005", "secret", "http://cb", Scope::Full)
        .await
        .unwrap();
    harness.store.watch(&harness.bus);

    exchanger.complete_exchange("code=ABC123").await.unwrap();

    // Nothing token-related was published when the token was written
    let at_write = auth_events(&harness.store.seen_at_write.lock().unwrap());
    assert!(!at_write
        .iter()
        .any(|event| matches!(event, AuthEvent::TokenReceived { .. })));

    let received: Vec<AuthEvent> = auth_events(&drain(&mut stream))
        .into_iter()
        .filter(|event| matches!(event, AuthEvent::TokenReceived { .. }))
        .collect();
    assert_eq!(
        received,
        vec![AuthEvent::TokenReceived {
            token: TOKEN.to_string()
        }]
    );
}

#[tokio::test]
async fn events_follow_the_flow_order() {
    let harness = Harness::new();
    let mut stream = EventStream::new(harness.bus.subscribe());
    let endpoint = Arc::new(TokenEndpoint::new(
        &harness.bus,
        HttpResponse::new(200, TOKEN_BODY),
    ));
    let exchanger = harness.exchanger(endpoint);

    exchanger
        .build_authorization_url("3005", "secret", "http://cb", Scope::Full)
        .await
        .unwrap();
    exchanger.complete_exchange("code=ABC123").await.unwrap();

    let kinds: Vec<&str> = drain(&mut stream)
        .iter()
        .map(|event| match event {
            CoreEvent::Auth(AuthEvent::AuthorizationStarted { .. }) => "started",
            CoreEvent::Auth(AuthEvent::CodeReceived { .. }) => "code",
            CoreEvent::Http(_) => "response",
            CoreEvent::Auth(AuthEvent::TokenReceived { .. }) => "token",
            CoreEvent::Auth(AuthEvent::AuthError { .. }) => "error",
        })
        .collect();

    assert_eq!(kinds, vec!["started", "code", "response", "token"]);
}

#[tokio::test]
async fn missing_code_is_malformed_redirect() {
    let harness = Harness::new();
    let mut client = MockHttpClient::new();
    client.expect_execute().never();
    let exchanger = harness.exchanger(Arc::new(client));

    exchanger
        .build_authorization_url("3005", "secret", "http://cb", Scope::Full)
        .await
        .unwrap();
    let result = exchanger
        .complete_exchange("http://cb/?state=private&error=access_denied")
        .await;

    assert!(matches!(result, Err(AuthError::MalformedRedirect(_))));
    assert_eq!(harness.session.access_token().await.unwrap(), None);
}

#[tokio::test]
async fn exchange_requires_client_id() {
    let harness = Harness::new();
    let mut client = MockHttpClient::new();
    client.expect_execute().never();
    let exchanger = harness.exchanger(Arc::new(client));

    let result = exchanger.complete_exchange("code=ABC123").await;

    assert!(matches!(result, Err(AuthError::InvalidArgument(_))));
}

#[tokio::test]
async fn token_body_without_access_token_is_malformed_response() {
    let harness = Harness::new();
    let mut client = MockHttpClient::new();
    client
        .expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, r#"{"message":"Bad Request"}"#)));
    let exchanger = harness.exchanger(Arc::new(client));

    exchanger
        .build_authorization_url("3005", "secret", "http://cb", Scope::Full)
        .await
        .unwrap();
    let result = exchanger.complete_exchange("code=ABC123").await;

    assert!(matches!(result, Err(AuthError::MalformedResponse(_))));
    assert!(harness.store.value(ACCESS_TOKEN_KEY).is_none());
}

#[tokio::test]
async fn token_endpoint_error_status_is_malformed_response() {
    let harness = Harness::new();
    let mut stream = EventStream::new(harness.bus.subscribe());
    let mut client = MockHttpClient::new();
    client
        .expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(400, r#"{"message":"Bad Request"}"#)));
    let exchanger = harness.exchanger(Arc::new(client));

    exchanger
        .build_authorization_url("3005", "secret", "http://cb", Scope::Full)
        .await
        .unwrap();
    let result = exchanger.complete_exchange("code=ABC123").await;

    assert!(matches!(result, Err(AuthError::MalformedResponse(_))));
    assert!(auth_events(&drain(&mut stream))
        .iter()
        .any(|event| matches!(event, AuthEvent::AuthError { .. })));
}

#[tokio::test]
async fn network_failure_surfaces_as_network_error() {
    let harness = Harness::new();
    let mut client = MockHttpClient::new();
    client
        .expect_execute()
        .times(1)
        .returning(|_| Err(BridgeError::Network("Connection failed".to_string())));
    let exchanger = harness.exchanger(Arc::new(client));

    exchanger
        .build_authorization_url("3005", "secret", "http://cb", Scope::Full)
        .await
        .unwrap();
    let result = exchanger.complete_exchange("code=ABC123").await;

    assert_eq!(
        result,
        Err(AuthError::Network("Connection failed".to_string()))
    );
}

#[tokio::test]
async fn repeated_exchange_with_same_token_writes_once() {
    let harness = Harness::new();
    let mut client = MockHttpClient::new();
    client
        .expect_execute()
        .times(2)
        .returning(|_| Ok(HttpResponse::new(200, TOKEN_BODY)));
    let exchanger = harness.exchanger(Arc::new(client));

    exchanger
        .build_authorization_url("3005", "secret", "http://cb", Scope::Full)
        .await
        .unwrap();
    let writes_before = harness.store.writes.load(Ordering::SeqCst);

    exchanger.complete_exchange("code=ONE").await.unwrap();
    exchanger.complete_exchange("code=TWO").await.unwrap();

    assert_eq!(harness.store.writes.load(Ordering::SeqCst) - writes_before, 1);
}

#[tokio::test]
async fn request_token_runs_the_broker_flow() {
    let harness = Harness::new();
    let mut client = MockHttpClient::new();
    client
        .expect_execute()
        .withf(|request| request.url.ends_with("&code=XYZ"))
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, TOKEN_BODY)));
    let exchanger = harness
        .exchanger(Arc::new(client))
        .with_broker(Arc::new(StubBroker(BrokerResult::success(
            "http://cb/?state=private&code=XYZ&scope=read",
        ))));

    let token = exchanger
        .request_token("3005", "secret", "http://cb", Scope::Full)
        .await
        .unwrap();

    assert_eq!(token.as_str(), TOKEN);
}

#[tokio::test]
async fn broker_http_error_carries_detail() {
    let harness = Harness::new();
    let mut client = MockHttpClient::new();
    client.expect_execute().never();
    let exchanger = harness
        .exchanger(Arc::new(client))
        .with_broker(Arc::new(StubBroker(BrokerResult::http_error("503"))));

    let result = exchanger
        .request_token("3005", "secret", "http://cb", Scope::Full)
        .await;

    assert_eq!(
        result,
        Err(AuthError::AuthBroker(
            "HTTP Error returned by authorization broker: 503".to_string()
        ))
    );
}

#[tokio::test]
async fn broker_cancellation_carries_status() {
    let harness = Harness::new();
    let mut client = MockHttpClient::new();
    client.expect_execute().never();
    let exchanger = harness
        .exchanger(Arc::new(client))
        .with_broker(Arc::new(StubBroker(BrokerResult::cancelled(None))));

    let result = exchanger
        .request_token("3005", "secret", "http://cb", Scope::Full)
        .await;

    assert_eq!(
        result,
        Err(AuthError::AuthBroker(
            "Error returned by authorization broker: UserCancel".to_string()
        ))
    );
}

#[tokio::test]
async fn request_token_without_broker_fails() {
    let harness = Harness::new();
    let exchanger = harness.exchanger(Arc::new(MockHttpClient::new()));

    let result = exchanger
        .request_token("3005", "secret", "http://cb", Scope::Full)
        .await;

    assert_eq!(result, Err(AuthError::BrokerUnavailable));
}
