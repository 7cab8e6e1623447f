//! CidrGate Core - Per-network rate limiting components
//!
//! This crate provides the core functionality for rate limiting HTTP clients
//! by the network block they belong to rather than by single address:
//! - Network key derivation (`192.168.1.15` at `/24` is `192.168.1.0/24`)
//! - A shared, sharded request history with per-network cooldowns
//! - A sliding window decision engine with atomic admission
//! - An injectable clock for deterministic tests
//! - The HTTP binding for the `/` and `/reset` routes
//!
//! # Overview
//!
//! `cidrgate-core` is framework-agnostic apart from the request handler.
//! Configuration is provided via the [`ConfigProvider`] trait, allowing
//! flexible configuration from any source.
//!
//! # Example
//!
//! ```rust
//! use cidrgate_core::{
//!     rate_limiter, Clock, ManualClock, NetworkKey, NetworkProvider, RateLimitCleanupConfig,
//!     RateLimitConfig, RateLimitingProvider, RequestHistory, TimeUnit,
//! };
//!
//! // Implement your own configuration provider using composable traits
//! struct MyConfig {
//!     rate_limit: RateLimitConfig,
//!     cleanup: RateLimitCleanupConfig,
//! }
//!
//! impl RateLimitingProvider for MyConfig {
//!     fn rate_limit_config(&self) -> &RateLimitConfig { &self.rate_limit }
//!     fn rate_limit_cleanup_config(&self) -> &RateLimitCleanupConfig { &self.cleanup }
//! }
//!
//! impl NetworkProvider for MyConfig {
//!     fn network_prefix(&self) -> u8 { 24 }
//! }
//!
//! let config = MyConfig {
//!     rate_limit: RateLimitConfig {
//!         threshold: 2,
//!         unit: TimeUnit::Minute,
//!         window_multiplier: 1,
//!         block_multiplier: 2,
//!     },
//!     cleanup: RateLimitCleanupConfig::default(),
//! };
//!
//! let history = RequestHistory::new();
//! let clock = ManualClock::new();
//! let key = NetworkKey::derive("192.168.1.15", config.network_prefix()).unwrap();
//!
//! assert!(rate_limiter::admit(&history, &key, clock.now(), &config));
//! assert!(rate_limiter::admit(&history, &key, clock.now(), &config));
//! assert!(!rate_limiter::admit(&history, &key, clock.now(), &config));
//! ```
//!
//! # Modules
//!
//! - [`types`] - Configuration types and the [`ConfigProvider`] trait
//! - [`error`] - Error types and result aliases
//! - [`defaults`] - Default configuration values
//! - [`headers`] - HTTP header and query constants
//! - [`clock`] - Time source abstraction
//! - [`network`] - Network key derivation
//! - [`history`] - Request history store
//! - [`rate_limiter`] - Decision engine
//! - [`request_handler`] - HTTP request processing

#![forbid(unsafe_code)]

pub mod clock;
pub mod defaults;
pub mod error;
pub mod headers;
pub mod history;
pub mod network;
pub mod rate_limiter;
pub mod request_handler;
#[cfg(test)]
pub mod test_utils;
pub mod types;

// Re-export commonly used items at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CidrGateError, Result};
pub use history::{NetworkRecord, RequestHistory};
pub use network::NetworkKey;
pub use types::{
    // Aggregated configuration trait
    ConfigProvider,
    // Composable configuration traits
    NetworkProvider,
    // Configuration structs
    RateLimitCleanupConfig,
    RateLimitConfig,
    RateLimitingProvider,
    TimeUnit,
};
