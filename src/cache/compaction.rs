//! Compaction Policy Module
//!
//! Decides when the backing maps should be rebuilt after deletions.

use crate::config::StoreConfig;

// == Compaction Policy ==
/// Amortized trigger for rebuilding the backing maps.
///
/// Compacts only when garbage clearly outweighs live data, so small or
/// slow-churning stores are never rebuilt over and over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionPolicy {
    /// Deletions must exceed this absolute count
    pub min_deletions: usize,
    /// Deletions must exceed `ratio * live`
    pub ratio: usize,
}

impl CompactionPolicy {
    // == Constructor ==
    /// Creates a policy from an absolute threshold and a garbage/live ratio.
    pub fn new(min_deletions: usize, ratio: usize) -> Self {
        Self {
            min_deletions,
            ratio,
        }
    }

    /// Creates a policy from the store's compaction settings.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.compaction_min_deletions, config.compaction_ratio)
    }

    /// Returns true when both thresholds are crossed.
    pub fn should_compact(&self, deletions: usize, live: usize) -> bool {
        deletions > self.min_deletions && deletions > live.saturating_mul(self.ratio)
    }
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}
