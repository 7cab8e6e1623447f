//! Network key derivation.
//!
//! Requests are limited per network block rather than per address: every
//! address is masked to the configured prefix and the resulting CIDR string
//! becomes the key in the request history.

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;

use crate::error::{CidrGateError, Result};

/// Canonical identifier of a network block, e.g. `"192.168.1.0/24"`.
///
/// Only obtainable through [`NetworkKey::derive`], so two addresses in the
/// same block always produce byte-identical keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkKey(String);

impl NetworkKey {
    /// Masks `address` to `prefix` bits and returns the block's key.
    ///
    /// # Errors
    ///
    /// - [`CidrGateError::MalformedAddress`] if `address` is not an IPv4 or
    ///   IPv6 literal (surrounding whitespace included)
    /// - [`CidrGateError::InvalidPrefix`] if `prefix` exceeds 32 for IPv4 or
    ///   128 for IPv6
    ///
    /// # Example
    ///
    /// ```
    /// use cidrgate_core::network::NetworkKey;
    ///
    /// let key = NetworkKey::derive("192.168.1.15", 24).unwrap();
    /// assert_eq!(key.as_str(), "192.168.1.0/24");
    ///
    /// assert!(NetworkKey::derive("192.168.1.15", 33).is_err());
    /// assert!(NetworkKey::derive("1.2.3", 24).is_err());
    /// ```
    pub fn derive(address: &str, prefix: u8) -> Result<Self> {
        let ip: IpAddr = address
            .parse()
            .map_err(|_| CidrGateError::MalformedAddress(address.to_string()))?;

        let network = IpNet::new(ip, prefix).map_err(|_| CidrGateError::InvalidPrefix {
            prefix,
            max: max_prefix_len(&ip),
        })?;

        Ok(Self(network.trunc().to_string()))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NetworkKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Largest prefix length valid for the address family of `ip`.
pub fn max_prefix_len(ip: &IpAddr) -> u8 {
    match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}
