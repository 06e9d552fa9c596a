//! Configuration Module
//!
//! Handles store tuning: default TTL, sweep cadence and compaction thresholds.

use std::env;
use std::time::Duration;

/// Store configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// TTL applied by `set_default` / `set_if_absent_default`
    pub default_ttl: Duration,
    /// Upper bound on the time between two reclaimer sweeps
    pub max_sweep_interval: Duration,
    /// Lower bound on the sweep period, so a zero TTL never busy-loops
    pub min_sweep_interval: Duration,
    /// Deletions that must accumulate before compaction is considered
    pub compaction_min_deletions: usize,
    /// Compaction also requires `deletions > ratio * live entries`
    pub compaction_ratio: usize,
}

impl StoreConfig {
    /// Creates a config with the given default TTL and default tuning.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            ..Self::default()
        }
    }

    /// Creates a new StoreConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `MAX_SWEEP_INTERVAL_MS` - Sweep ceiling in milliseconds (default: 60000)
    /// - `MIN_SWEEP_INTERVAL_MS` - Sweep floor in milliseconds (default: 10)
    /// - `COMPACTION_MIN_DELETIONS` - Absolute compaction threshold (default: 1024)
    /// - `COMPACTION_RATIO` - Garbage to live ratio for compaction (default: 2)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: env_millis("DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl),
            max_sweep_interval: env_millis("MAX_SWEEP_INTERVAL_MS")
                .unwrap_or(defaults.max_sweep_interval),
            min_sweep_interval: env_millis("MIN_SWEEP_INTERVAL_MS")
                .unwrap_or(defaults.min_sweep_interval),
            compaction_min_deletions: env::var("COMPACTION_MIN_DELETIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.compaction_min_deletions),
            compaction_ratio: env::var("COMPACTION_RATIO")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.compaction_ratio),
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_max_sweep_interval(mut self, interval: Duration) -> Self {
        self.max_sweep_interval = interval;
        self
    }

    pub fn with_min_sweep_interval(mut self, interval: Duration) -> Self {
        self.min_sweep_interval = interval;
        self
    }

    pub fn with_compaction(mut self, min_deletions: usize, ratio: usize) -> Self {
        self.compaction_min_deletions = min_deletions;
        self.compaction_ratio = ratio;
        self
    }

    /// Period of the background sweep.
    ///
    /// The lesser of the ceiling and the default TTL, never below the floor.
    pub fn sweep_interval(&self) -> Duration {
        self.max_sweep_interval
            .min(self.default_ttl)
            .max(self.min_sweep_interval)
            .max(Duration::from_millis(1))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            max_sweep_interval: Duration::from_secs(60),
            min_sweep_interval: Duration::from_millis(10),
            compaction_min_deletions: 1024,
            compaction_ratio: 2,
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
}
