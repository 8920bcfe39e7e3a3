//! Loopback Authorization Broker
//!
//! Desktop flavour of the authorization broker: the authorization page is
//! opened in the system browser and the provider's redirect is caught by a
//! small HTTP listener bound to the callback address.
//!
//! Connections that carry no request (browser preconnects) are dropped and
//! requests for other paths (`/favicon.ico`) get a 404; the listener keeps
//! waiting until a request for the callback path arrives.

use async_trait::async_trait;
use bridge_traits::{
    broker::{AuthorizationBroker, BrokerResult},
    error::{BridgeError, Result},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// Opens the authorization URL for the user (usually the system browser).
pub type UrlLauncher = Arc<dyn Fn(&str) + Send + Sync>;

const CALLBACK_PAGE: &str = "<html><body><p>Authorization received. You can close this window.</p></body></html>";
const NOT_FOUND_PAGE: &str = "<html><body><p>Not found.</p></body></html>";

/// How long an accepted connection may stay silent before it is dropped.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Authorization broker that waits for the redirect on a loopback socket.
pub struct LoopbackAuthBroker {
    listener: Mutex<TcpListener>,
    local_addr: SocketAddr,
    launcher: Option<UrlLauncher>,
    read_timeout: Duration,
}

impl LoopbackAuthBroker {
    /// Bind the callback listener to an explicit address.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(BridgeError::Io)?;
        let local_addr = listener.local_addr().map_err(BridgeError::Io)?;

        debug!(%local_addr, "Bound authorization callback listener");

        Ok(Self {
            listener: Mutex::new(listener),
            local_addr,
            launcher: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    /// Bind to the host and port named by a callback URI such as
    /// `http://127.0.0.1:8080/callback`.
    pub async fn for_callback(callback_uri: &str) -> Result<Self> {
        let url = Url::parse(callback_uri).map_err(|e| {
            BridgeError::OperationFailed(format!("Invalid callback URI '{}': {}", callback_uri, e))
        })?;

        let host = url.host_str().unwrap_or("127.0.0.1");
        let port = url.port_or_known_default().unwrap_or(80);
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .or_else(|_| format!("127.0.0.1:{}", port).parse())
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Unsupported callback host: {}", e))
            })?;

        Self::bind(addr).await
    }

    /// Install the callback used to show the authorization page.
    pub fn with_launcher(mut self, launcher: UrlLauncher) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Drop accepted connections that send nothing within `timeout`.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn launch(&self, start_url: &str) {
        match &self.launcher {
            Some(launcher) => launcher(start_url),
            None => info!(url = %start_url, "Open this URL to authorize the application"),
        }
    }

    /// Rebuild the absolute redirect URL from the request target.
    fn redirect_url(&self, callback_uri: &str, target: &str) -> String {
        Url::parse(callback_uri)
            .and_then(|base| base.join(target))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("http://{}{}", self.local_addr, target))
    }

    fn classify(redirect: String) -> BrokerResult {
        let error = Url::parse(&redirect).ok().and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "error")
                .map(|(_, value)| value.into_owned())
        });

        match error {
            Some(reason) if reason == "access_denied" => BrokerResult::cancelled(Some(reason)),
            Some(reason) => BrokerResult::http_error(reason),
            None => BrokerResult::success(redirect),
        }
    }
}

/// Extract the request target from the first line of an HTTP request head.
fn request_target(head: &str) -> Option<&str> {
    let line = head.lines().next()?;
    let mut parts = line.split_whitespace();
    let _method = parts.next()?;
    parts.next()
}

/// Path portion of a request target, without query or fragment.
fn target_path(target: &str) -> &str {
    target.split(['?', '#']).next().unwrap_or_default()
}

fn is_callback_path(callback_path: &str, target: &str) -> bool {
    target_path(target).trim_end_matches('/') == callback_path.trim_end_matches('/')
}

async fn respond(socket: &mut TcpStream, status_line: &str, page: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        page.len(),
        page
    );
    if let Err(e) = socket.write_all(response.as_bytes()).await {
        warn!(error = %e, "Failed to answer authorization callback");
    }
    socket.shutdown().await.ok();
}

#[async_trait]
impl AuthorizationBroker for LoopbackAuthBroker {
    async fn authenticate(&self, start_url: &str, callback_uri: &str) -> Result<BrokerResult> {
        let callback_path = Url::parse(callback_uri)
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| "/".to_string());
        let listener = self.listener.lock().await;

        self.launch(start_url);

        let mut buf = vec![0u8; 8192];
        loop {
            let (mut socket, peer) = listener.accept().await.map_err(BridgeError::Io)?;
            debug!(%peer, "Accepted authorization callback connection");

            let n = match tokio::time::timeout(self.read_timeout, socket.read(&mut buf)).await {
                Ok(Ok(0)) => {
                    debug!(%peer, "Ignoring empty connection");
                    continue;
                }
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    warn!(%peer, error = %e, "Failed to read callback connection");
                    continue;
                }
                Err(_) => {
                    debug!(%peer, "Dropping idle connection");
                    continue;
                }
            };
            let head = String::from_utf8_lossy(&buf[..n]).to_string();

            match request_target(&head) {
                Some(target) if is_callback_path(&callback_path, target) => {
                    respond(&mut socket, "200 OK", CALLBACK_PAGE).await;
                    return Ok(Self::classify(self.redirect_url(callback_uri, target)));
                }
                target => {
                    debug!(
                        path = target.map(target_path).unwrap_or_default(),
                        "Ignoring request outside the callback path"
                    );
                    respond(&mut socket, "404 Not Found", NOT_FOUND_PAGE).await;
                }
            }
        }
    }
}
