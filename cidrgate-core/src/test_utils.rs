//! Test utilities for cidrgate.
//!
//! Shared test configuration used across unit tests. Only compiled when
//! running tests (`#[cfg(test)]`).

use crate::types::{
    NetworkProvider, RateLimitCleanupConfig, RateLimitConfig, RateLimitingProvider, TimeUnit,
};

/// Shared test configuration for unit tests.
///
/// Implements all provider traits with the production defaults and offers
/// builder methods for customization.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    pub rate_limit: RateLimitConfig,
    pub cleanup: RateLimitCleanupConfig,
    pub network_prefix: u8,
}

impl TestConfig {
    /// Create a new test configuration with defaults (/24, 100 per minute).
    pub fn new() -> Self {
        Self {
            network_prefix: crate::defaults::NETWORK_PREFIX,
            ..Self::default()
        }
    }

    /// Configure threshold, window and cooldown.
    pub fn with_rate_limit(
        mut self,
        threshold: u32,
        unit: TimeUnit,
        window_multiplier: u32,
        block_multiplier: u32,
    ) -> Self {
        self.rate_limit = RateLimitConfig {
            threshold,
            unit,
            window_multiplier,
            block_multiplier,
        };
        self
    }

    /// Configure cleanup threshold.
    pub fn with_cleanup(mut self, threshold: usize) -> Self {
        self.cleanup.threshold = threshold;
        self
    }

    /// Configure the network prefix length.
    pub fn with_prefix(mut self, prefix: u8) -> Self {
        self.network_prefix = prefix;
        self
    }
}

impl RateLimitingProvider for TestConfig {
    fn rate_limit_config(&self) -> &RateLimitConfig {
        &self.rate_limit
    }

    fn rate_limit_cleanup_config(&self) -> &RateLimitCleanupConfig {
        &self.cleanup
    }
}

impl NetworkProvider for TestConfig {
    fn network_prefix(&self) -> u8 {
        self.network_prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = TestConfig::new();
        assert_eq!(config.rate_limit.threshold, 100);
        assert_eq!(config.rate_limit.window_duration(), Duration::from_secs(60));
        assert_eq!(config.network_prefix, 24);
        assert!(config.cleanup.is_enabled());
    }

    #[test]
    fn test_builder_methods() {
        let config = TestConfig::new()
            .with_rate_limit(5, TimeUnit::Second, 10, 30)
            .with_cleanup(0)
            .with_prefix(16);

        assert_eq!(config.rate_limit.threshold, 5);
        assert_eq!(config.rate_limit.window_duration(), Duration::from_secs(10));
        assert_eq!(config.rate_limit.block_duration(), Duration::from_secs(30));
        assert!(!config.cleanup.is_enabled());
        assert_eq!(config.network_prefix(), 16);
    }
}
