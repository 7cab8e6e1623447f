//! CidrGate - Per-network HTTP rate limiting
//!
//! An HTTP service that rate limits clients by the network block they belong
//! to. Every address inside the same `/NETWORK_PREFIX` block shares one
//! request budget; a block that reaches its threshold is put in cooldown.
//!
//! # Overview
//!
//! - Client address taken from the first `X-Forwarded-For` entry
//! - Sliding window counting with a fixed-length cooldown
//! - `/reset?ip=<address>` to forget a network
//! - Configuration from environment variables, validated at startup
//! - Structured logging with JSON support
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cidrgate::{config::EnvVarConfig, connection::ConnectionTracker, server};
//! use cidrgate::{RequestHistory, SystemClock};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(EnvVarConfig::from_env()?);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!
//! server::serve(
//!     listener,
//!     RequestHistory::new(),
//!     config,
//!     Arc::new(SystemClock),
//!     ConnectionTracker::new(),
//!     async { let _ = tokio::signal::ctrl_c().await; },
//! )
//! .await;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`env_vars`] - Environment variable constants
//! - [`server`] - Logging setup, startup info and the accept loop
//! - [`connection`] - Connection tracking for graceful shutdown
//! - [`args`] - Command line argument parsing
//!
//! # Re-exports from cidrgate-core
//!
//! Core functionality is provided by the `cidrgate-core` crate:
//! - [`network`] - Network key derivation
//! - [`rate_limiter`] - Decision engine
//! - [`request_handler`] - HTTP request processing

#![forbid(unsafe_code)]

pub mod args;
pub mod config;
pub mod connection;
pub mod env_vars;
pub mod server;

// Re-export cidrgate-core modules
pub use cidrgate_core::network;
pub use cidrgate_core::rate_limiter;
pub use cidrgate_core::request_handler;
pub use cidrgate_core::types;

// Re-export commonly used items at crate root
pub use config::EnvVarConfig;
pub use cidrgate_core::{
    CidrGateError,
    Clock,
    // Aggregated configuration trait
    ConfigProvider,
    ManualClock,
    NetworkKey,
    // Composable configuration traits
    NetworkProvider,
    RateLimitCleanupConfig,
    RateLimitConfig,
    RateLimitingProvider,
    RequestHistory,
    SystemClock,
    TimeUnit,
};
