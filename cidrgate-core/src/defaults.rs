//! Default configuration values for cidrgate.
//!
//! Shared by the environment loader and by tests so both agree on what an
//! unset variable means.

use std::time::Duration;

use crate::types::TimeUnit;

/// Default prefix length used to group client addresses.
pub const NETWORK_PREFIX: u8 = 24;

/// Default maximum requests per window before the cooldown arms.
pub const NUMBER_OF_REQUESTS: u32 = 100;

/// Default unit that window and cooldown multipliers are expressed in.
pub const UNIT_TIME: TimeUnit = TimeUnit::Minute;

/// Default window length, in [`UNIT_TIME`]s.
pub const LIMIT_TIME: u32 = 1;

/// Default cooldown length, in [`UNIT_TIME`]s.
pub const WAIT_TIME: u32 = 2;

/// Default cleanup threshold (number of tracked networks before a sweep).
pub const RATE_LIMIT_CLEANUP_THRESHOLD: usize = 10_000;

/// Default cleanup interval in seconds.
pub const RATE_LIMIT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Default cleanup interval duration.
pub const RATE_LIMIT_CLEANUP_INTERVAL: Duration =
    Duration::from_secs(RATE_LIMIT_CLEANUP_INTERVAL_SECS);

/// Default bind address.
pub const HOST: &str = "0.0.0.0";

/// Default listen port.
pub const PORT: u16 = 8000;
