//! Expiry Table Module
//!
//! The state protected by the store guard: parallel value and expiry maps
//! plus the deletion counter that drives compaction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::compaction::CompactionPolicy;

// == Expiry Table ==
/// Two maps keyed by the same key, always mutated together.
///
/// Not synchronized on its own; every access goes through the store guard.
#[derive(Debug)]
pub(crate) struct ExpiryTable<V> {
    /// Current value per key
    values: HashMap<String, V>,
    /// Absolute deadline per key
    expirations: HashMap<String, Instant>,
    /// Logical deletions since the last compaction
    deletions: usize,
}

impl<V> ExpiryTable<V> {
    // == Constructor ==
    pub(crate) fn new() -> Self {
        Self {
            values: HashMap::new(),
            expirations: HashMap::new(),
            deletions: 0,
        }
    }

    // == Liveness ==
    /// Returns the value if the key is present and `expiry > now`.
    pub(crate) fn live(&self, key: &str, now: Instant) -> Option<&V> {
        match self.expirations.get(key) {
            Some(expiry) if *expiry > now => self.values.get(key),
            _ => None,
        }
    }

    /// Remaining TTL of a live key.
    pub(crate) fn remaining(&self, key: &str, now: Instant) -> Option<Duration> {
        self.expirations
            .get(key)
            .filter(|expiry| **expiry > now)
            .map(|expiry| *expiry - now)
    }

    // == Insert ==
    /// Stores `value` with deadline `now + ttl`, replacing any prior pair.
    pub(crate) fn insert(&mut self, key: String, value: V, ttl: Duration, now: Instant) {
        // Saturate instead of panicking on absurd TTLs
        let expiry = now.checked_add(ttl).unwrap_or_else(far_future);
        self.expirations.insert(key.clone(), expiry);
        self.values.insert(key, value);
    }

    // == Remove ==
    /// Removes the key from both maps. Returns true if anything was removed.
    pub(crate) fn remove(&mut self, key: &str) -> bool {
        let had_value = self.values.remove(key).is_some();
        let had_expiry = self.expirations.remove(key).is_some();
        debug_assert_eq!(had_value, had_expiry, "value and expiry maps diverged");

        if had_value {
            self.deletions += 1;
        }
        had_value
    }

    // == Sweep ==
    /// Removes every entry whose deadline is not after now.
    ///
    /// Now is read per scanned entry. Returns the number removed.
    pub(crate) fn sweep_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .expirations
            .iter()
            .filter(|(_, expiry)| **expiry <= Instant::now())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    // == Compaction ==
    /// Rebuilds both maps into fresh allocations if the policy says so.
    ///
    /// Returns true if a rebuild happened.
    pub(crate) fn compact_if_needed(&mut self, policy: &CompactionPolicy) -> bool {
        if !policy.should_compact(self.deletions, self.values.len()) {
            return false;
        }
        self.compact();
        true
    }

    pub(crate) fn compact(&mut self) {
        let mut values = HashMap::with_capacity(self.values.len());
        values.extend(self.values.drain());
        let mut expirations = HashMap::with_capacity(self.expirations.len());
        expirations.extend(self.expirations.drain());

        self.values = values;
        self.expirations = expirations;
        self.deletions = 0;
    }

    // == Introspection ==
    /// Keys whose deadline is after now.
    pub(crate) fn live_keys(&self, now: Instant) -> Vec<String> {
        self.expirations
            .iter()
            .filter(|(_, expiry)| **expiry > now)
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub(crate) fn live_len(&self, now: Instant) -> usize {
        self.expirations.values().filter(|expiry| **expiry > now).count()
    }

    /// Entries physically held, including expired ones not yet swept.
    pub(crate) fn stored_len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn deletions(&self) -> usize {
        self.deletions
    }

    /// Allocated slots of the value map.
    pub(crate) fn capacity(&self) -> usize {
        self.values.capacity()
    }
}

/// A deadline no TTL will reach in practice (~30 years out).
fn far_future() -> Instant {
    let now = Instant::now();
    now.checked_add(Duration::from_secs(60 * 60 * 24 * 365 * 30))
        .unwrap_or(now)
}
