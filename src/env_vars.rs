//! Environment variable names used throughout CidrGate configuration

/// Network key derivation
pub const NETWORK_PREFIX: &str = "NETWORK_PREFIX";

/// Rate limiting configuration
pub const NUMBER_OF_REQUESTS: &str = "NUMBER_OF_REQUESTS";
pub const UNIT_TIME: &str = "UNIT_TIME";
pub const LIMIT_TIME: &str = "LIMIT_TIME";
pub const WAIT_TIME: &str = "WAIT_TIME";

/// History cleanup configuration
pub const RATE_LIMIT_CLEANUP_THRESHOLD: &str = "RATE_LIMIT_CLEANUP_THRESHOLD";
pub const RATE_LIMIT_CLEANUP_INTERVAL_SECS: &str = "RATE_LIMIT_CLEANUP_INTERVAL_SECS";

/// Listener configuration (read by clap, see [`crate::args::Args`])
pub const HOST: &str = "HOST";
pub const PORT: &str = "PORT";

/// Get all environment variable names for documentation/validation
pub fn all_env_vars() -> &'static [&'static str] {
    &[
        NETWORK_PREFIX,
        NUMBER_OF_REQUESTS,
        UNIT_TIME,
        LIMIT_TIME,
        WAIT_TIME,
        RATE_LIMIT_CLEANUP_THRESHOLD,
        RATE_LIMIT_CLEANUP_INTERVAL_SECS,
        HOST,
        PORT,
    ]
}
