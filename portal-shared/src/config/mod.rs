//! # Configuration
//!
//! Settings for the Agent Portal client: where the API lives, where the
//! session is persisted, and how chatty logging is.

/// Client configuration and its layered loader.
pub mod client;

pub use client::{ConfigError, ConfigOverrides, MAX_EARNINGS_WEEKS, PortalConfig};
