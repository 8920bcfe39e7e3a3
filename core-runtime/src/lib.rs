//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the Strava client core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! Every other core crate depends on this one for its logging conventions and
//! for the `CoreEvent` notifications it publishes.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{ApiEndpoints, CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{AuthEvent, CoreEvent, EventBus, EventStream, HttpEvent, ResponseSnapshot};
