//! Rate limiting decision engine for cidrgate.
//!
//! Decides, per network block, whether a request is admitted, and arms the
//! cooldown the moment a block reaches its threshold.
//!
//! # Algorithm
//!
//! For a network key and an instant `now`:
//! 1. An unknown key is always allowed
//! 2. Requests at or after `now - window` are counted, newest first
//! 3. A running cooldown denies regardless of the count
//! 4. `count < threshold` allows
//! 5. `count == threshold` arms a cooldown of `block` length and denies
//! 6. `count > threshold` denies without touching the cooldown
//!
//! # Admission
//!
//! [`admit`] runs evaluate, record and evaluate again while holding the
//! network's entry guard, so two concurrent requests from one block can never
//! both observe `threshold - 1`. The second evaluation is what arms the
//! cooldown on exactly the request that reaches the threshold.
//!
//! # Memory Management
//!
//! [`admit`] trims instants that fell out of the window before counting, and
//! sweeps idle networks when the number of tracked networks exceeds the
//! configured cleanup threshold (at most once per cleanup interval).
//!
//! # Example
//!
//! ```ignore
//! use cidrgate_core::{rate_limiter, NetworkKey, RequestHistory};
//!
//! let history = RequestHistory::new();
//! let key = NetworkKey::derive("192.168.1.15", 24)?;
//!
//! if rate_limiter::admit(&history, &key, clock.now(), &config) {
//!     // Request allowed
//! } else {
//!     // Too many requests from 192.168.1.0/24
//! }
//! ```

use std::cmp::Ordering;
use std::time::Instant;

use tracing::{debug, info};

use crate::history::{NetworkRecord, RequestHistory};
use crate::network::NetworkKey;
use crate::types::{RateLimitConfig, RateLimitingProvider};

/// Decides whether a request from `key` at `now` is allowed.
///
/// Read-only with respect to history: an unknown key is allowed without
/// creating a record, and nothing is appended. The only side effect is
/// arming the cooldown when the window count equals the threshold.
///
/// # Arguments
///
/// * `history` - Shared request history
/// * `key` - Network block of the request
/// * `now` - Decision instant
/// * `config` - Configuration provider for threshold, window and cooldown
///
/// # Returns
///
/// - `true` - Request is allowed
/// - `false` - Request is rate limited (should return 429)
pub fn evaluate(
    history: &RequestHistory,
    key: &NetworkKey,
    now: Instant,
    config: &impl RateLimitingProvider,
) -> bool {
    match history.inner().get_mut(key) {
        Some(mut entry) => decide(entry.value_mut(), key, now, config.rate_limit_config()),
        None => true,
    }
}

/// Admits or rejects a request from `key` at `now` as one atomic step.
///
/// Equivalent to `evaluate`, then (if allowed) `record_request` followed by
/// a second `evaluate`, with the network's entry locked throughout. Rejected
/// requests are not recorded.
///
/// # Returns
///
/// - `true` - Request is allowed and has been recorded
/// - `false` - Request is rate limited (should return 429)
///
/// # Example
///
/// ```ignore
/// use cidrgate_core::rate_limiter::admit;
///
/// if !admit(&history, &key, clock.now(), config.as_ref()) {
///     return Ok(text_response(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests\n"));
/// }
/// ```
pub fn admit(
    history: &RequestHistory,
    key: &NetworkKey,
    now: Instant,
    config: &impl RateLimitingProvider,
) -> bool {
    // Must run before the entry guard below: retain locks every shard.
    maybe_cleanup(history, now, config);

    let rate_config = config.rate_limit_config();
    let mut entry = history.entry_mut(key);
    let record = entry.value_mut();

    if let Some(window_start) = now.checked_sub(rate_config.window_duration()) {
        record.trim_before(window_start);
    }

    if !decide(record, key, now, rate_config) {
        debug!(network = %key, "Request rejected");
        return false;
    }

    record.requests.push_back(now);
    decide(record, key, now, rate_config);

    debug!(
        network = %key,
        tracked_requests = record.requests.len(),
        "Request admitted"
    );
    true
}

/// Removes every network that cannot influence a decision at `now`.
///
/// A network is removed when it has no request inside the window and no
/// running cooldown; such a record decides exactly like an absent one.
///
/// Returns the number of networks removed.
pub fn cleanup(
    history: &RequestHistory,
    now: Instant,
    config: &impl RateLimitingProvider,
) -> usize {
    let window_start = now.checked_sub(config.rate_limit_config().window_duration());
    history.retain(|_, record| !record.is_idle_at(window_start, now))
}

/// Sweeps idle networks when the map is over its threshold and the last
/// sweep is at least one cleanup interval old.
fn maybe_cleanup(history: &RequestHistory, now: Instant, config: &impl RateLimitingProvider) {
    let cleanup_config = config.rate_limit_cleanup_config();
    if !cleanup_config.is_enabled() || history.len() <= cleanup_config.threshold {
        return;
    }

    let should_cleanup = {
        let mut last_cleanup = history.last_cleanup().lock();
        match *last_cleanup {
            Some(last) if now.saturating_duration_since(last) < cleanup_config.interval => false,
            _ => {
                *last_cleanup = Some(now);
                true
            }
        }
    };

    if should_cleanup {
        let removed = cleanup(history, now, config);
        debug!(
            removed_networks = removed,
            remaining_networks = history.len(),
            "Request history cleanup completed"
        );
    }
}

/// Window count and cooldown state machine shared by [`evaluate`] and [`admit`].
fn decide(
    record: &mut NetworkRecord,
    key: &NetworkKey,
    now: Instant,
    rate_config: &RateLimitConfig,
) -> bool {
    let window_start = now.checked_sub(rate_config.window_duration());
    let count = record.count_since(window_start);

    if record.is_blocked_at(now) {
        return false;
    }

    match count.cmp(&(rate_config.threshold as usize)) {
        Ordering::Less => true,
        Ordering::Equal => {
            record.blocked_until = Some(now + rate_config.block_duration());
            info!(
                network = %key,
                window_requests = count,
                cooldown_secs = rate_config.block_duration().as_secs(),
                "Threshold reached, network blocked"
            );
            false
        }
        Ordering::Greater => false,
    }
}
