//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - Connection pooling via reqwest
/// - TLS support by default (rustls)
///
/// Every status code is returned as a regular response and nothing is
/// retried; status interpretation belongs to the request pipeline.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("strava-client-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    /// Map a reqwest failure without the request URL, whose query may carry
    /// the client secret or an access token.
    fn classify_error(error: reqwest::Error) -> BridgeError {
        let error = error.without_url();
        if error.is_timeout() {
            BridgeError::Network("Request timed out".to_string())
        } else if error.is_connect() {
            BridgeError::Network(format!("Connection failed: {}", error))
        } else {
            BridgeError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let endpoint = loggable_endpoint(&request.url);
        debug!(method = %request.method, endpoint = %endpoint, "Executing HTTP request");

        let response = self.build_request(request).send().await.map_err(|e| {
            let error = Self::classify_error(e);
            warn!(endpoint = %endpoint, error = %error, "HTTP request failed");
            error
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response.bytes().await.map_err(Self::classify_error)?;

        debug!(status = status, bytes = body.len(), "Received HTTP response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Scheme, host and path of `raw`, dropping the query and fragment.
fn loggable_endpoint(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => format!(
            "{}://{}{}{}",
            url.scheme(),
            url.host_str().unwrap_or_default(),
            url.port().map(|port| format!(":{}", port)).unwrap_or_default(),
            url.path()
        ),
        Err(_) => "<invalid url>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP/1.1 response and return the request head.
    async fn serve_once(raw_response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(raw_response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_http_client_creation() {
        let _client = ReqwestHttpClient::new().unwrap();
    }

    #[tokio::test]
    async fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Get),
            reqwest::Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Post),
            reqwest::Method::POST
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Delete),
            reqwest::Method::DELETE
        );
    }

    #[tokio::test]
    async fn test_execute_collects_status_headers_and_body() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nX-RateLimit-Usage: 10,100\r\nConnection: close\r\n\r\nhello",
        )
        .await;

        let client = ReqwestHttpClient::new().unwrap();
        let response = client
            .execute(HttpRequest::new(HttpMethod::Get, format!("{}/ping", base)))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text().unwrap(), "hello");
        assert_eq!(response.header("X-RateLimit-Usage"), Some("10,100"));

        let request_head = server.await.unwrap();
        assert!(request_head.starts_with("GET /ping HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_error_status_is_not_an_error() {
        let (base, _server) = serve_once(
            "HTTP/1.1 403 Forbidden\r\nContent-Length: 9\r\nConnection: close\r\n\r\nforbidden",
        )
        .await;

        let client = ReqwestHttpClient::new().unwrap();
        let response = client
            .execute(HttpRequest::new(HttpMethod::Post, base))
            .await
            .unwrap();

        assert_eq!(response.status, 403);
        assert_eq!(response.text().unwrap(), "forbidden");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ReqwestHttpClient::new().unwrap();
        let result = client
            .execute(HttpRequest::new(HttpMethod::Get, format!("http://{}", addr)))
            .await;

        assert!(matches!(result, Err(BridgeError::Network(_))));
    }

    #[test]
    fn test_loggable_endpoint_drops_query() {
        assert_eq!(
            loggable_endpoint("https://www.strava.com/oauth/token?client_id=1&client_secret=s&code=c"),
            "https://www.strava.com/oauth/token"
        );
        assert_eq!(
            loggable_endpoint("http://127.0.0.1:8089/api/v3/uploads/7?access_token=t#frag"),
            "http://127.0.0.1:8089/api/v3/uploads/7"
        );
        assert_eq!(loggable_endpoint("not a url"), "<invalid url>");
    }

    /// Shared buffer handed to the fmt layer as its writer.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    #[tokio::test]
    async fn test_failed_request_keeps_query_out_of_logs_and_errors() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("bridge_desktop=debug"))
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ReqwestHttpClient::new().unwrap();
        let url = format!(
            "http://{}/oauth/token?client_id=1&client_secret=TOPSECRET&code=C0DE",
            addr
        );
        let error = client
            .execute(HttpRequest::new(HttpMethod::Post, url))
            .await
            .unwrap_err();

        assert!(matches!(error, BridgeError::Network(_)));
        let message = error.to_string();
        assert!(!message.contains("TOPSECRET"), "{message}");
        assert!(!message.contains("C0DE"), "{message}");

        let captured = logs.contents();
        assert!(captured.contains("/oauth/token"), "{captured}");
        assert!(!captured.contains("TOPSECRET"), "{captured}");
        assert!(!captured.contains("C0DE"), "{captured}");
    }
}
