//! HTTP header and query constants for cidrgate.

/// X-Forwarded-For header - carries the originating client address.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Content-Type header.
pub const CONTENT_TYPE: &str = "content-type";

/// Content type of every response body.
pub const TEXT_PLAIN: &str = "text/plain";

/// Query parameter naming the address whose network is reset.
pub const RESET_IP_PARAM: &str = "ip";

/// Extracts the originating client address from an `X-Forwarded-For` value.
///
/// The header lists `client, proxy1, proxy2`; the first entry is the client.
/// The entry is only trimmed, not validated: a garbage value must still reach
/// key derivation so it can be rejected there.
///
/// # Example
///
/// ```
/// use cidrgate_core::headers::client_address_from_xff;
///
/// assert_eq!(client_address_from_xff("203.0.113.7, 10.0.0.1"), "203.0.113.7");
/// assert_eq!(client_address_from_xff("1.2.3"), "1.2.3");
/// ```
pub fn client_address_from_xff(xff: &str) -> &str {
    xff.split(',').next().unwrap_or_default().trim()
}
