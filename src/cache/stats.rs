//! Store Statistics Module
//!
//! Tracks store activity: hits, misses, reclaimed entries and compactions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stats Counters ==
/// Live counters updated by store operations.
///
/// Atomic so reads can record hits while holding only the shared guard.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired_removed: AtomicU64,
    deletions: AtomicU64,
    compactions: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deletion(&self) {
        self.deletions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expired(&self, count: usize) {
        self.expired_removed.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_compaction(&self) {
        self.compactions.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the counters into a serializable snapshot.
    pub(crate) fn snapshot(
        &self,
        live_entries: usize,
        stored_entries: usize,
        pending_deletions: usize,
    ) -> StoreStats {
        StoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired_removed: self.expired_removed.load(Ordering::Relaxed),
            deletions: self.deletions.load(Ordering::Relaxed),
            compactions: self.compactions.load(Ordering::Relaxed),
            live_entries,
            stored_entries,
            pending_deletions,
        }
    }
}

// == Store Stats ==
/// Point-in-time view of store activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Reads that found a live entry
    pub hits: u64,
    /// Reads that found nothing or an expired entry
    pub misses: u64,
    /// Entries physically removed by sweeps
    pub expired_removed: u64,
    /// Entries removed by explicit deletes
    pub deletions: u64,
    /// Backing map rebuilds
    pub compactions: u64,
    /// Entries currently visible to readers
    pub live_entries: usize,
    /// Entries physically held, including expired but unswept ones
    pub stored_entries: usize,
    /// Deletions since the last compaction
    pub pending_deletions: usize,
}

impl StoreStats {
    // == Hit Rate ==
    /// Calculates the read hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = StatsCounters::default().snapshot(0, 0, 0);
        assert_eq!(stats, StoreStats::default());
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = StatsCounters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        counters.record_deletion();
        counters.record_expired(3);
        counters.record_compaction();

        let stats = counters.snapshot(7, 9, 4);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.deletions, 1);
        assert_eq!(stats.expired_removed, 3);
        assert_eq!(stats.compactions, 1);
        assert_eq!(stats.live_entries, 7);
        assert_eq!(stats.stored_entries, 9);
        assert_eq!(stats.pending_deletions, 4);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(StoreStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = StoreStats {
            hits: 1,
            misses: 1,
            ..StoreStats::default()
        };
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = StoreStats {
            hits: 4,
            live_entries: 2,
            ..StoreStats::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["hits"], 4);
        assert_eq!(json["live_entries"], 2);
        assert_eq!(json["compactions"], 0);
    }
}
