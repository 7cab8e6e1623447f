//! Type definitions for cidrgate configuration.
//!
//! This module contains:
//! - Composable provider traits the engine and handlers are generic over
//! - Rate limiting and cleanup configuration
//! - The [`TimeUnit`] windows and cooldowns are expressed in

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CidrGateError;

// ============================================================================
// Composable Configuration Traits
// ============================================================================

/// Configuration for the rate limiting decision engine.
pub trait RateLimitingProvider: Send + Sync {
    /// Returns the rate limiting configuration.
    fn rate_limit_config(&self) -> &RateLimitConfig;

    /// Returns the history cleanup configuration.
    fn rate_limit_cleanup_config(&self) -> &RateLimitCleanupConfig;
}

/// Configuration for turning addresses into network keys.
pub trait NetworkProvider: Send + Sync {
    /// Returns the number of leading address bits that identify a network.
    fn network_prefix(&self) -> u8;
}

// ============================================================================
// ConfigProvider - Aggregated trait for full configuration
// ============================================================================

/// Trait for complete configuration injection.
///
/// Implement the individual traits; the blanket implementation makes any
/// such type a `ConfigProvider`.
///
/// # Example
///
/// ```
/// use cidrgate_core::{
///     NetworkProvider, RateLimitingProvider, RateLimitConfig, RateLimitCleanupConfig, TimeUnit,
/// };
/// use std::time::Duration;
///
/// struct MyConfig;
///
/// impl RateLimitingProvider for MyConfig {
///     fn rate_limit_config(&self) -> &RateLimitConfig {
///         static CONFIG: RateLimitConfig = RateLimitConfig {
///             threshold: 100,
///             unit: TimeUnit::Minute,
///             window_multiplier: 1,
///             block_multiplier: 2,
///         };
///         &CONFIG
///     }
///
///     fn rate_limit_cleanup_config(&self) -> &RateLimitCleanupConfig {
///         static CONFIG: RateLimitCleanupConfig = RateLimitCleanupConfig {
///             threshold: 10_000,
///             interval: Duration::from_secs(60),
///         };
///         &CONFIG
///     }
/// }
///
/// impl NetworkProvider for MyConfig {
///     fn network_prefix(&self) -> u8 { 24 }
/// }
/// ```
pub trait ConfigProvider: RateLimitingProvider + NetworkProvider {}

// Blanket implementation: any type implementing all sub-traits is a ConfigProvider
impl<T> ConfigProvider for T where T: RateLimitingProvider + NetworkProvider {}

// ============================================================================
// TimeUnit
// ============================================================================

/// Unit that window and cooldown multipliers are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    /// One second.
    Second,
    /// One minute.
    #[default]
    Minute,
    /// One hour.
    Hour,
}

impl TimeUnit {
    /// Returns the length of one unit.
    pub const fn as_duration(self) -> Duration {
        match self {
            Self::Second => Duration::from_secs(1),
            Self::Minute => Duration::from_secs(60),
            Self::Hour => Duration::from_secs(3600),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = CidrGateError;

    /// Parses `second`, `minute` or `hour`, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "second" => Ok(Self::Second),
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            _ => Err(CidrGateError::ConfigError(format!(
                "unknown time unit '{s}' (expected Second, Minute or Hour)"
            ))),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Second => "Second",
            Self::Minute => "Minute",
            Self::Hour => "Hour",
        })
    }
}

// ============================================================================
// Configuration structs
// ============================================================================

/// Configuration for per-network rate limiting.
///
/// The sliding window is `unit × window_multiplier` long; the cooldown armed
/// when a network reaches `threshold` lasts `unit × block_multiplier`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use cidrgate_core::{RateLimitConfig, TimeUnit};
///
/// let config = RateLimitConfig {
///     threshold: 100,
///     unit: TimeUnit::Minute,
///     window_multiplier: 1,
///     block_multiplier: 2,
/// };
///
/// assert!(config.is_valid());
/// assert_eq!(config.window_duration(), Duration::from_secs(60));
/// assert_eq!(config.block_duration(), Duration::from_secs(120));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed inside one window before the cooldown arms
    pub threshold: u32,
    /// Unit both multipliers are expressed in
    pub unit: TimeUnit,
    /// Window length in units
    pub window_multiplier: u32,
    /// Cooldown length in units
    pub block_multiplier: u32,
}

impl RateLimitConfig {
    /// Length of the sliding window.
    pub fn window_duration(&self) -> Duration {
        self.unit.as_duration() * self.window_multiplier
    }

    /// Length of the cooldown imposed when the threshold is reached.
    pub fn block_duration(&self) -> Duration {
        self.unit.as_duration() * self.block_multiplier
    }

    /// Returns `true` if every tunable is positive.
    pub fn is_valid(&self) -> bool {
        self.threshold > 0 && self.window_multiplier > 0 && self.block_multiplier > 0
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            threshold: crate::defaults::NUMBER_OF_REQUESTS,
            unit: crate::defaults::UNIT_TIME,
            window_multiplier: crate::defaults::LIMIT_TIME,
            block_multiplier: crate::defaults::WAIT_TIME,
        }
    }
}

/// Configuration for sweeping networks that no longer affect any decision.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use cidrgate_core::RateLimitCleanupConfig;
///
/// let config = RateLimitCleanupConfig {
///     threshold: 10_000,
///     interval: Duration::from_secs(60),
/// };
///
/// assert!(config.is_enabled());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitCleanupConfig {
    /// Number of tracked networks before a sweep is considered (0 = disabled)
    pub threshold: usize,
    /// Minimum interval between sweeps
    pub interval: Duration,
}

impl RateLimitCleanupConfig {
    /// Returns `true` if automatic cleanup is enabled.
    pub fn is_enabled(&self) -> bool {
        self.threshold > 0
    }
}

impl Default for RateLimitCleanupConfig {
    fn default() -> Self {
        Self {
            threshold: crate::defaults::RATE_LIMIT_CLEANUP_THRESHOLD,
            interval: crate::defaults::RATE_LIMIT_CLEANUP_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // TimeUnit tests
    // ===========================================

    #[test]
    fn test_time_unit_durations() {
        assert_eq!(TimeUnit::Second.as_duration(), Duration::from_secs(1));
        assert_eq!(TimeUnit::Minute.as_duration(), Duration::from_secs(60));
        assert_eq!(TimeUnit::Hour.as_duration(), Duration::from_secs(3600));
    }

    #[test]
    fn test_time_unit_parse_case_insensitive() {
        assert_eq!("Second".parse::<TimeUnit>().unwrap(), TimeUnit::Second);
        assert_eq!("minute".parse::<TimeUnit>().unwrap(), TimeUnit::Minute);
        assert_eq!("HOUR".parse::<TimeUnit>().unwrap(), TimeUnit::Hour);
        assert_eq!(" Hour ".parse::<TimeUnit>().unwrap(), TimeUnit::Hour);
    }

    #[test]
    fn test_time_unit_parse_unknown() {
        assert!("day".parse::<TimeUnit>().is_err());
        assert!("".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_time_unit_display_round_trips() {
        for unit in [TimeUnit::Second, TimeUnit::Minute, TimeUnit::Hour] {
            assert_eq!(unit.to_string().parse::<TimeUnit>().unwrap(), unit);
        }
    }

    // ===========================================
    // RateLimitConfig tests
    // ===========================================

    #[test]
    fn test_rate_limit_config_defaults() {
        let config = RateLimitConfig::default();
        assert_eq!(config.threshold, 100);
        assert_eq!(config.unit, TimeUnit::Minute);
        assert_eq!(config.window_duration(), Duration::from_secs(60));
        assert_eq!(config.block_duration(), Duration::from_secs(120));
        assert!(config.is_valid());
    }

    #[test]
    fn test_rate_limit_config_multiplies_unit() {
        let config = RateLimitConfig {
            threshold: 5,
            unit: TimeUnit::Second,
            window_multiplier: 30,
            block_multiplier: 90,
        };
        assert_eq!(config.window_duration(), Duration::from_secs(30));
        assert_eq!(config.block_duration(), Duration::from_secs(90));
    }

    #[test]
    fn test_rate_limit_config_invalid_zero_threshold() {
        let config = RateLimitConfig {
            threshold: 0,
            ..RateLimitConfig::default()
        };
        assert!(!config.is_valid());
    }

    #[test]
    fn test_rate_limit_config_invalid_zero_multipliers() {
        let config = RateLimitConfig {
            window_multiplier: 0,
            ..RateLimitConfig::default()
        };
        assert!(!config.is_valid());

        let config = RateLimitConfig {
            block_multiplier: 0,
            ..RateLimitConfig::default()
        };
        assert!(!config.is_valid());
    }

    // ===========================================
    // RateLimitCleanupConfig tests
    // ===========================================

    #[test]
    fn test_cleanup_config_enabled() {
        assert!(RateLimitCleanupConfig::default().is_enabled());
    }

    #[test]
    fn test_cleanup_config_disabled_zero_threshold() {
        let config = RateLimitCleanupConfig {
            threshold: 0,
            interval: Duration::from_secs(60),
        };
        assert!(!config.is_enabled());
    }
}
