//! Connect an account and print the issued access token.
//!
//! ```text
//! STRAVA_CLIENT_ID=3005 STRAVA_CLIENT_SECRET=... \
//!     cargo run -p core-service --example connect
//! ```
//!
//! The authorization URL is printed; open it in a browser and approve the
//! request. The redirect is captured on the callback address
//! (`STRAVA_CALLBACK_URI`, default `http://127.0.0.1:8089/`).

use std::sync::Arc;

use anyhow::Context;
use bridge_desktop::LoopbackAuthBroker;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::{framework_version, AuthEvent, CoreConfig, CoreEvent, Scope, StravaService};

const DEFAULT_CALLBACK: &str = "http://127.0.0.1:8089/";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))
        .context("failed to initialize logging")?;

    let client_id = std::env::var("STRAVA_CLIENT_ID").context("STRAVA_CLIENT_ID is not set")?;
    let client_secret =
        std::env::var("STRAVA_CLIENT_SECRET").context("STRAVA_CLIENT_SECRET is not set")?;
    let callback_uri =
        std::env::var("STRAVA_CALLBACK_URI").unwrap_or_else(|_| DEFAULT_CALLBACK.to_string());

    let broker = LoopbackAuthBroker::for_callback(&callback_uri)
        .await
        .context("failed to bind the callback listener")?
        .with_launcher(Arc::new(|url: &str| {
            println!("Open this URL to authorize:\n\n    {url}\n");
        }));

    let config = CoreConfig::builder()
        .auth_broker(Arc::new(broker))
        .build()?;
    let service = StravaService::new(config);
    println!("strava client core {}", framework_version());

    let mut events = service
        .subscribe()
        .filter(|event| matches!(event, CoreEvent::Auth(_)));
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                CoreEvent::Auth(AuthEvent::TokenReceived { .. }) => {
                    println!("Token received.");
                }
                CoreEvent::Auth(AuthEvent::AuthError { message }) => {
                    eprintln!("Authorization failed: {message}");
                }
                other => println!("{}", other.description()),
            }
        }
    });

    let token = service
        .request_token(&client_id, &client_secret, &callback_uri, Scope::Full)
        .await?;
    println!("Access token: {}", token.as_str());

    let limits = service.rate_limits();
    println!(
        "Rate limits: {}/{} (15 min), {}/{} (daily)",
        limits.usage.short_term, limits.limit.short_term, limits.usage.long_term, limits.limit.long_term
    );

    drop(service);
    printer.abort();
    Ok(())
}
