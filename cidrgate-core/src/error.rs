//! Error types for cidrgate.
//!
//! The decision engine itself is total; errors only come from turning a raw
//! client address into a network key and from loading configuration.

use thiserror::Error;

/// Result type alias for cidrgate operations.
pub type Result<T> = std::result::Result<T, CidrGateError>;

/// Unified error type for cidrgate operations.
///
/// # Example
///
/// ```
/// use cidrgate_core::error::{CidrGateError, Result};
///
/// fn require_address(raw: &str) -> Result<&str> {
///     if raw.is_empty() {
///         return Err(CidrGateError::MalformedAddress(raw.into()));
///     }
///     Ok(raw)
/// }
///
/// assert!(require_address("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrGateError {
    /// The client address could not be parsed as IPv4 or IPv6.
    #[error("Malformed address: '{0}'")]
    MalformedAddress(String),

    /// The prefix length does not fit the address family.
    #[error("Invalid prefix length /{prefix} (max /{max})")]
    InvalidPrefix {
        /// Requested prefix length.
        prefix: u8,
        /// Largest prefix the address family supports.
        max: u8,
    },

    /// Configuration error (unparseable or out-of-range value).
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CidrGateError {
    /// Returns the HTTP status code the transport answers with.
    ///
    /// Key derivation failures map to 500 for compatibility with existing
    /// clients even though they usually reflect bad client input.
    pub fn status_code(&self) -> hyper::StatusCode {
        use hyper::StatusCode;

        match self {
            Self::MalformedAddress(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidPrefix { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the response body sent to clients.
    ///
    /// Internal details (the offending address, the prefix) are never echoed.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MalformedAddress(_) | Self::InvalidPrefix { .. } | Self::ConfigError(_) => {
                "Internal Server Error\n"
            }
        }
    }

    /// Returns true if this error points at the server rather than the client.
    ///
    /// Used to choose between `warn!` and `error!` when logging.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::InvalidPrefix { .. } | Self::ConfigError(_))
    }
}
