//! Rate-limit bookkeeping
//!
//! Strava reports consumption on every response through two headers, each a
//! `short,long` pair: the 15-minute window and the daily window.
//!
//! ```text
//! X-RateLimit-Usage: 10,100
//! X-RateLimit-Limit: 600,30000
//! ```
//!
//! The tracker keeps the values from the most recent response carrying them.
//! Concurrent responses race and the last writer wins.

use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

use crate::error::{HttpError, Result};

pub const USAGE_HEADER: &str = "X-RateLimit-Usage";
pub const LIMIT_HEADER: &str = "X-RateLimit-Limit";

/// Counter pair for the short (15 minute) and long (daily) windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPair {
    pub short_term: u32,
    pub long_term: u32,
}

impl RateLimitPair {
    pub fn new(short_term: u32, long_term: u32) -> Self {
        Self {
            short_term,
            long_term,
        }
    }

    /// Parse a `short,long` header value.
    pub fn parse(header: &str, value: &str) -> Result<Self> {
        let malformed = || HttpError::MalformedHeader {
            header: header.to_string(),
            value: value.to_string(),
        };

        let mut parts = value.split(',');
        let (Some(short), Some(long), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };

        let short_term = short.trim().parse().map_err(|_| malformed())?;
        let long_term = long.trim().parse().map_err(|_| malformed())?;

        Ok(Self::new(short_term, long_term))
    }
}

/// Last-known usage and limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub usage: RateLimitPair,
    pub limit: RateLimitPair,
}

/// Shared rate-limit state, updated by the transport after every response.
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    state: RwLock<RateLimitSnapshot>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn usage(&self) -> RateLimitPair {
        self.snapshot().usage
    }

    pub fn limit(&self) -> RateLimitPair {
        self.snapshot().limit
    }

    /// Overwrite usage from an `X-RateLimit-Usage` value.
    ///
    /// On error the previous usage is kept.
    pub fn update_usage(&self, value: &str) -> Result<()> {
        let usage = RateLimitPair::parse(USAGE_HEADER, value)?;
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .usage = usage;
        Ok(())
    }

    /// Overwrite limit from an `X-RateLimit-Limit` value.
    ///
    /// On error the previous limit is kept.
    pub fn update_limit(&self, value: &str) -> Result<()> {
        let limit = RateLimitPair::parse(LIMIT_HEADER, value)?;
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .limit = limit;
        Ok(())
    }
}
