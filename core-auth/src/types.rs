use serde::{Deserialize, Serialize};
use std::fmt;

/// Access level requested from the athlete.
///
/// # Examples
///
/// ```
/// use core_auth::Scope;
///
/// assert_eq!(Scope::Full.as_str(), "view_private,write");
/// assert_eq!(Scope::Public.to_string(), "public");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Private data and write access
    Full,
    /// Public data only
    Public,
    /// Private data, read only
    ViewPrivate,
    /// Write access to public data
    Write,
}

impl Scope {
    /// Wire value for the `scope` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Full => "view_private,write",
            Scope::Public => "public",
            Scope::ViewPrivate => "view_private",
            Scope::Write => "write",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bearer credential returned by the token endpoint.
///
/// The value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Body of a successful token exchange.
///
/// The endpoint sends more (token type, athlete summary); only the token is
/// kept.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}
