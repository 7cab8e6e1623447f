//! Request history store.
//!
//! Maps each [`NetworkKey`] to the instants of its recent requests and its
//! cooldown deadline. The map is a sharded [`DashMap`]: holding the entry of
//! one network serializes requests from that network without stalling
//! traffic from networks stored in other shards. The number of tracked
//! networks is kept in a counter so reading it never visits every shard.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::RefMut;
use parking_lot::Mutex;

use crate::network::NetworkKey;

/// Per-network request state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkRecord {
    /// Request instants in arrival order (oldest first)
    pub requests: VecDeque<Instant>,
    /// End of the active cooldown, if one was ever armed
    pub blocked_until: Option<Instant>,
}

impl NetworkRecord {
    /// Counts requests at or after `window_start`, scanning from the newest.
    ///
    /// Stops at the first instant strictly before `window_start`; arrival
    /// order is chronological so nothing older can be in the window. `None`
    /// means the window reaches back past the earliest representable instant
    /// and every request counts.
    pub fn count_since(&self, window_start: Option<Instant>) -> usize {
        match window_start {
            Some(start) => self
                .requests
                .iter()
                .rev()
                .take_while(|&&at| at >= start)
                .count(),
            None => self.requests.len(),
        }
    }

    /// Returns `true` if a cooldown is still running at `now`.
    pub fn is_blocked_at(&self, now: Instant) -> bool {
        self.blocked_until.is_some_and(|until| until > now)
    }

    /// Drops requests strictly before `window_start` from the front.
    ///
    /// Returns the number of instants removed.
    pub fn trim_before(&mut self, window_start: Instant) -> usize {
        let before = self.requests.len();
        while self.requests.front().is_some_and(|&at| at < window_start) {
            self.requests.pop_front();
        }
        before - self.requests.len()
    }

    /// Returns `true` if this record cannot influence any decision at `now`:
    /// nothing inside the window and no running cooldown.
    pub fn is_idle_at(&self, window_start: Option<Instant>, now: Instant) -> bool {
        self.count_since(window_start) == 0 && !self.is_blocked_at(now)
    }
}

/// Thread-safe request history shared across all connections.
///
/// Cloning is cheap and clones share state.
///
/// # Example
///
/// ```
/// use cidrgate_core::{NetworkKey, RequestHistory};
/// use std::time::Instant;
///
/// let history = RequestHistory::new();
/// let key = NetworkKey::derive("10.0.0.7", 24).unwrap();
///
/// history.record_request(&key, Instant::now());
/// assert_eq!(history.record(&key).requests.len(), 1);
///
/// history.forget(&key);
/// assert!(history.record(&key).requests.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestHistory {
    inner: Arc<DashMap<NetworkKey, NetworkRecord>>,
    tracked: Arc<AtomicUsize>,
    last_cleanup: Arc<Mutex<Option<Instant>>>,
}

impl RequestHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `at` to the history of `key`, creating the record if needed.
    pub fn record_request(&self, key: &NetworkKey, at: Instant) {
        self.entry_mut(key).requests.push_back(at);
    }

    /// Removes every trace of `key`, including a running cooldown.
    ///
    /// Returns `true` if a record existed. Forgetting an unknown key is not
    /// an error.
    pub fn forget(&self, key: &NetworkKey) -> bool {
        let removed = self.inner.remove(key).is_some();
        if removed {
            self.tracked.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    /// Returns a snapshot of the record for `key`, or an empty record.
    pub fn record(&self, key: &NetworkKey) -> NetworkRecord {
        self.inner
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns `true` if `key` has a record.
    pub fn contains(&self, key: &NetworkKey) -> bool {
        self.inner.contains_key(key)
    }

    /// Number of tracked networks.
    pub fn len(&self) -> usize {
        self.tracked.load(Ordering::Relaxed)
    }

    /// Returns `true` if no network is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locks the record of `key`, creating an empty one if needed.
    pub(crate) fn entry_mut(&self, key: &NetworkKey) -> RefMut<'_, NetworkKey, NetworkRecord> {
        match self.inner.entry(key.clone()) {
            Entry::Occupied(entry) => entry.into_ref(),
            Entry::Vacant(entry) => {
                self.tracked.fetch_add(1, Ordering::Relaxed);
                entry.insert(NetworkRecord::default())
            }
        }
    }

    /// Keeps only the records for which `keep` returns `true`.
    ///
    /// Locks each shard in turn. Returns the number of records removed.
    pub(crate) fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&NetworkKey, &mut NetworkRecord) -> bool,
    {
        let mut removed = 0;
        self.inner.retain(|key, record| {
            let kept = keep(key, record);
            if !kept {
                removed += 1;
            }
            kept
        });
        self.tracked.fetch_sub(removed, Ordering::Relaxed);
        removed
    }

    pub(crate) fn inner(&self) -> &DashMap<NetworkKey, NetworkRecord> {
        &self.inner
    }

    pub(crate) fn last_cleanup(&self) -> &Mutex<Option<Instant>> {
        &self.last_cleanup
    }
}
