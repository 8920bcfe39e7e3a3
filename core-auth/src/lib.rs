//! # Authentication Module
//!
//! Authorization-code flow against the Strava OAuth endpoints.
//!
//! ## Overview
//!
//! - [`TokenExchanger`] builds the authorization URL, drives the broker
//!   redirect and exchanges the code for an access token
//! - [`AuthSession`] holds the session state and persists the access token
//!   and client id through the injected `SettingsStore`
//! - Progress is published as `AuthEvent`s on the core event bus
//!
//! Tokens do not expire in this flow; there is no refresh logic.

pub mod error;
pub mod exchanger;
pub mod session;
pub mod types;

pub use error::{AuthError, Result};
pub use exchanger::TokenExchanger;
pub use session::{AuthSession, ACCESS_TOKEN_KEY, CLIENT_ID_KEY};
pub use types::{AccessToken, Scope, TokenResponse};
