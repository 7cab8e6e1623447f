//! Configuration management for CidrGate.
//!
//! This module loads every tunable from environment variables exactly once,
//! at startup, into an [`EnvVarConfig`]. The configuration is immutable
//! afterwards and shared behind an `Arc`.
//!
//! # Validation
//!
//! - Integer variables must parse; an unparseable value is fatal
//! - `NUMBER_OF_REQUESTS`, `LIMIT_TIME` and `WAIT_TIME` must be positive
//! - `NETWORK_PREFIX` must be at most 128 (values above 32 only suit IPv6)
//! - An unknown `UNIT_TIME` falls back to `Minute` with a warning
//!
//! Unset or blank variables use the defaults from
//! [`cidrgate_core::defaults`].
//!
//! # Example
//!
//! ```
//! use cidrgate::config::EnvVarConfig;
//! use cidrgate::types::RateLimitingProvider;
//!
//! let config = EnvVarConfig::from_env_with(|_| Err(std::env::VarError::NotPresent)).unwrap();
//! assert_eq!(config.rate_limit_config().threshold, 100);
//! ```

use std::env::{self, VarError};
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::env_vars;
use cidrgate_core::defaults;
use cidrgate_core::{
    CidrGateError, NetworkProvider, RateLimitCleanupConfig, RateLimitConfig, RateLimitingProvider,
    Result, TimeUnit,
};

/// Largest prefix any address family accepts.
const MAX_NETWORK_PREFIX: u8 = 128;

/// Largest prefix an IPv4 address accepts.
const MAX_IPV4_PREFIX: u8 = 32;

// ============================================================================
// Internal Helpers
// ============================================================================

/// Reads `var_name` through `env_var`, treating unset and blank alike.
fn read_var<F>(env_var: &F, var_name: &str) -> Option<String>
where
    F: Fn(&str) -> std::result::Result<String, VarError>,
{
    env_var(var_name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses an environment variable with fallback to a default value.
///
/// A value that is present but cannot be parsed is a configuration error.
fn parse_env_var_or_default<F, T>(env_var: &F, var_name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> std::result::Result<String, VarError>,
    T: FromStr,
{
    match read_var(env_var, var_name) {
        Some(value) => value.parse().map_err(|_| {
            CidrGateError::ConfigError(format!("{var_name}: invalid value '{value}'"))
        }),
        None => Ok(default),
    }
}

/// Parses `UNIT_TIME`, falling back to the default unit on unknown names.
fn parse_time_unit<F>(env_var: &F) -> TimeUnit
where
    F: Fn(&str) -> std::result::Result<String, VarError>,
{
    match read_var(env_var, env_vars::UNIT_TIME) {
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(
                var = env_vars::UNIT_TIME,
                value = %value,
                default = %defaults::UNIT_TIME,
                "Unknown time unit, using default"
            );
            defaults::UNIT_TIME
        }),
        None => defaults::UNIT_TIME,
    }
}

// ============================================================================
// EnvVarConfig - ConfigProvider implementation using environment variables
// ============================================================================

/// Configuration provider that reads from environment variables.
///
/// This is the default configuration provider for the CidrGate server.
/// All values are read and validated at creation time.
///
/// # Example
///
/// ```
/// use cidrgate::config::EnvVarConfig;
/// use cidrgate::types::NetworkProvider;
///
/// let config = EnvVarConfig::from_env_with(|name| match name {
///     "NETWORK_PREFIX" => Ok("16".to_string()),
///     _ => Err(std::env::VarError::NotPresent),
/// })
/// .unwrap();
/// assert_eq!(config.network_prefix(), 16);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvVarConfig {
    rate_limit: RateLimitConfig,
    cleanup: RateLimitCleanupConfig,
    network_prefix: u8,
}

impl EnvVarConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| env::var(key))
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`CidrGateError::ConfigError`] when a value does not parse or
    /// is out of range.
    pub fn from_env_with<F>(env_var: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        let network_prefix = parse_env_var_or_default(
            &env_var,
            env_vars::NETWORK_PREFIX,
            defaults::NETWORK_PREFIX,
        )?;
        if network_prefix > MAX_NETWORK_PREFIX {
            return Err(CidrGateError::ConfigError(format!(
                "{}: prefix /{network_prefix} exceeds /{MAX_NETWORK_PREFIX}",
                env_vars::NETWORK_PREFIX
            )));
        }
        if network_prefix > MAX_IPV4_PREFIX {
            warn!(
                prefix = network_prefix,
                "Network prefix only fits IPv6, IPv4 clients will receive errors"
            );
        }

        let rate_limit = RateLimitConfig {
            threshold: parse_env_var_or_default(
                &env_var,
                env_vars::NUMBER_OF_REQUESTS,
                defaults::NUMBER_OF_REQUESTS,
            )?,
            unit: parse_time_unit(&env_var),
            window_multiplier: parse_env_var_or_default(
                &env_var,
                env_vars::LIMIT_TIME,
                defaults::LIMIT_TIME,
            )?,
            block_multiplier: parse_env_var_or_default(
                &env_var,
                env_vars::WAIT_TIME,
                defaults::WAIT_TIME,
            )?,
        };
        if !rate_limit.is_valid() {
            return Err(CidrGateError::ConfigError(format!(
                "{}, {} and {} must be greater than 0",
                env_vars::NUMBER_OF_REQUESTS,
                env_vars::LIMIT_TIME,
                env_vars::WAIT_TIME
            )));
        }

        let cleanup = RateLimitCleanupConfig {
            threshold: parse_env_var_or_default(
                &env_var,
                env_vars::RATE_LIMIT_CLEANUP_THRESHOLD,
                defaults::RATE_LIMIT_CLEANUP_THRESHOLD,
            )?,
            interval: Duration::from_secs(parse_env_var_or_default(
                &env_var,
                env_vars::RATE_LIMIT_CLEANUP_INTERVAL_SECS,
                defaults::RATE_LIMIT_CLEANUP_INTERVAL_SECS,
            )?),
        };

        Ok(Self {
            rate_limit,
            cleanup,
            network_prefix,
        })
    }
}

impl Default for EnvVarConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            cleanup: RateLimitCleanupConfig::default(),
            network_prefix: defaults::NETWORK_PREFIX,
        }
    }
}

impl RateLimitingProvider for EnvVarConfig {
    fn rate_limit_config(&self) -> &RateLimitConfig {
        &self.rate_limit
    }

    fn rate_limit_cleanup_config(&self) -> &RateLimitCleanupConfig {
        &self.cleanup
    }
}

impl NetworkProvider for EnvVarConfig {
    fn network_prefix(&self) -> u8 {
        self.network_prefix
    }
}
