//! # Request Pipeline
//!
//! Shared HTTP request/response handling for the Strava client core.
//!
//! ## Overview
//!
//! - [`HttpTransport`] issues GET/POST/PUT/DELETE through an injected
//!   `HttpClient`, with no retry
//! - [`RateLimitTracker`] keeps the last reported `X-RateLimit-*` counters
//! - [`ResponseBody`] separates content from the soft failure produced by a
//!   non-success status
//! - [`unmarshal`] turns bodies into typed records
//!
//! Every response, whatever its status, updates the rate limits and is
//! published as `HttpEvent::ResponseReceived` on the event bus before the
//! caller sees it.

pub mod error;
pub mod rate_limit;
pub mod transport;
pub mod unmarshal;

pub use error::{HttpError, Result};
pub use rate_limit::{RateLimitPair, RateLimitSnapshot, RateLimitTracker};
pub use transport::{HttpTransport, ResponseBody};
pub use unmarshal::unmarshal;
