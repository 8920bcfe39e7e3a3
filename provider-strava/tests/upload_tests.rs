//! Integration tests for the upload status client

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::storage::SettingsStore;
use core_auth::{AccessToken, AuthSession};
use core_http::{HttpTransport, RateLimitTracker};
use mockall::mock;
use provider_strava::{CurrentUploadStatus, StravaError, UploadClient};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const API_BASE: &str = "https://www.strava.com/api/v3";

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

#[derive(Default)]
struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
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

async fn session_with_token(token: Option<&str>) -> Arc<AuthSession> {
    let session = Arc::new(AuthSession::new(Arc::new(MemoryStore::default())));
    if let Some(token) = token {
        session
            .set_access_token(AccessToken::new(token))
            .await
            .unwrap();
    }
    session
}

fn client(mock: MockHttpClient, session: Arc<AuthSession>) -> UploadClient {
    let transport = HttpTransport::new(Arc::new(mock), Arc::new(RateLimitTracker::new()));
    UploadClient::new(transport, session, API_BASE)
}

#[tokio::test]
async fn check_upload_status_returns_processing_upload() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute()
        .withf(|request| {
            request.method == HttpMethod::Get
                && request.url == "https://www.strava.com/api/v3/uploads/42?access_token=tok"
        })
        .times(1)
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"id":42,"external_id":"ride.gpx","error":null,"status":"Your activity is still being processed.","activity_id":null}"#,
            ))
        });

    let uploads = client(mock, session_with_token(Some("tok")).await);
    let upload = uploads.check_upload_status(42).await.unwrap();

    assert_eq!(upload.id, 42);
    assert_eq!(upload.current_status(), CurrentUploadStatus::Processing);
}

#[tokio::test]
async fn check_upload_status_reports_ready_activity() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute().times(1).returning(|_| {
        Ok(HttpResponse::new(
            200,
            r#"{"id":42,"external_id":"ride.gpx","error":null,"status":"Your activity is ready.","activity_id":1001}"#,
        ))
    });

    let uploads = client(mock, session_with_token(Some("tok")).await);
    let upload = uploads.check_upload_status(42).await.unwrap();

    assert_eq!(upload.activity_id, Some(1001));
    assert_eq!(upload.current_status(), CurrentUploadStatus::Ready);
}

#[tokio::test]
async fn check_upload_status_requires_token() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute().never();

    let uploads = client(mock, session_with_token(None).await);
    let result = uploads.check_upload_status(42).await;

    assert_eq!(result, Err(StravaError::NotAuthenticated));
}

#[tokio::test]
async fn check_upload_status_maps_soft_failure_to_api_error() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(404, r#"{"message":"Record Not Found"}"#)));

    let uploads = client(mock, session_with_token(Some("tok")).await);
    let result = uploads.check_upload_status(42).await;

    assert_eq!(result, Err(StravaError::ApiError { status: 404 }));
}

#[tokio::test]
async fn check_upload_status_rejects_unparseable_body() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, "<html>")));

    let uploads = client(mock, session_with_token(Some("tok")).await);
    let result = uploads.check_upload_status(42).await;

    assert!(matches!(result, Err(StravaError::ParseError(_))));
}

#[tokio::test]
async fn check_upload_status_surfaces_network_error() {
    let mut mock = MockHttpClient::new();
    mock.expect_execute()
        .times(1)
        .returning(|_| Err(BridgeError::Network("Connection reset".to_string())));

    let uploads = client(mock, session_with_token(Some("tok")).await);
    let result = uploads.check_upload_status(42).await;

    assert!(matches!(result, Err(StravaError::Http(_))));
}
