//! Expiring Store Module
//!
//! Main store engine: a guarded expiry table, a background reclaimer and
//! amortized compaction.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use crate::cache::{CompactionPolicy, ExpiryTable, StatsCounters, StoreStats};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::tasks::{reclaim_cycle, spawn_reclaimer, ReclaimerHandle, SweepReport};

// == Shared State ==
/// State shared by every store handle and, weakly, by the reclaimer.
pub(crate) struct Shared<V> {
    /// One guard for both maps and the deletion counter
    pub(crate) table: RwLock<ExpiryTable<V>>,
    pub(crate) stats: StatsCounters,
    pub(crate) config: StoreConfig,
    pub(crate) policy: CompactionPolicy,
    /// Dropped with the last handle, which also stops the reclaimer
    pub(crate) shutdown_tx: watch::Sender<bool>,
    reclaimer: Mutex<Option<ReclaimerHandle>>,
}

impl<V> Shared<V> {
    fn new(config: StoreConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            table: RwLock::new(ExpiryTable::new()),
            stats: StatsCounters::default(),
            policy: CompactionPolicy::from_config(&config),
            config,
            shutdown_tx,
            reclaimer: Mutex::new(None),
        }
    }
}

// == Expiring Store ==
/// Concurrency-safe key-value store with per-entry TTL.
///
/// Cloning yields another handle to the same store. The background
/// reclaimer runs until [`ExpiringStore::shutdown`] is called or the last
/// handle is dropped.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ttl_kv::ExpiringStore;
///
/// let store: ExpiringStore<u32> = ExpiringStore::new(Duration::from_secs(60));
/// store.set("a", 1, Duration::from_secs(5));
/// assert_eq!(store.get("a"), Ok(1));
/// assert!(!store.set_if_absent("a", 2, Duration::from_secs(5)));
/// ```
pub struct ExpiringStore<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for ExpiringStore<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> fmt::Debug for ExpiringStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringStore")
            .field("config", &self.shared.config)
            .field("stored_len", &self.shared.table.read().stored_len())
            .finish()
    }
}

impl<V> ExpiringStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a store whose `*_default` operations use `default_ttl`.
    ///
    /// Starts the reclaimer on a dedicated thread, independent of any
    /// Tokio runtime the caller may be running on.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_config(StoreConfig::new(default_ttl))
    }

    /// Creates a store with custom sweep and compaction tuning.
    pub fn with_config(config: StoreConfig) -> Self {
        let shared = Arc::new(Shared::new(config));
        let handle = spawn_reclaimer(&shared);
        *shared.reclaimer.lock() = handle;
        Self { shared }
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Expired entries are reported as missing but left for the reclaimer,
    /// so reads never need the exclusive guard.
    pub fn get(&self, key: &str) -> Result<V> {
        let table = self.shared.table.read();
        match table.live(key, Instant::now()) {
            Some(value) => {
                self.shared.stats.record_hit();
                Ok(value.clone())
            }
            None => {
                self.shared.stats.record_miss();
                Err(StoreError::KeyNotFound(key.to_string()))
            }
        }
    }

    // == Set ==
    /// Stores a value expiring after `ttl`, replacing any prior entry.
    ///
    /// A zero `ttl` stores an entry that is already expired.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let mut table = self.shared.table.write();
        table.insert(key.into(), value, ttl, Instant::now());
    }

    /// Stores a value with the store's default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.shared.config.default_ttl);
    }

    // == Delete ==
    /// Removes an entry. Deleting a missing key is a no-op.
    pub fn delete(&self, key: &str) {
        let removed = self.shared.table.write().remove(key);
        if removed {
            self.shared.stats.record_deletion();
        }
    }

    // == Set If Absent ==
    /// Stores the value only if the key is not live. Returns true if stored.
    ///
    /// The check and the write happen under one exclusive guard, so racing
    /// callers on the same key see exactly one winner.
    pub fn set_if_absent(&self, key: impl Into<String>, value: V, ttl: Duration) -> bool {
        let key = key.into();
        let mut table = self.shared.table.write();
        let now = Instant::now();
        if table.live(&key, now).is_some() {
            return false;
        }
        table.insert(key, value, ttl, now);
        true
    }

    /// [`set_if_absent`](Self::set_if_absent) with the default TTL.
    pub fn set_if_absent_default(&self, key: impl Into<String>, value: V) -> bool {
        self.set_if_absent(key, value, self.shared.config.default_ttl)
    }

    // == Keys ==
    /// Snapshot of live keys in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.shared.table.read().live_keys(Instant::now())
    }

    // == Introspection ==
    /// Time left before a live key expires.
    pub fn ttl_remaining(&self, key: &str) -> Result<Duration> {
        self.shared
            .table
            .read()
            .remaining(key, Instant::now())
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    /// Returns true if the key is live. Does not count as a hit or miss.
    pub fn contains_key(&self, key: &str) -> bool {
        self.shared.table.read().live(key, Instant::now()).is_some()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.shared.table.read().live_len(Instant::now())
    }

    /// Returns true if no entry is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// TTL used by `set_default` and `set_if_absent_default`.
    pub fn default_ttl(&self) -> Duration {
        self.shared.config.default_ttl
    }

    /// Configuration the store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// Allocated slots of the backing value map.
    pub fn capacity(&self) -> usize {
        self.shared.table.read().capacity()
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> StoreStats {
        let table = self.shared.table.read();
        self.shared.stats.snapshot(
            table.live_len(Instant::now()),
            table.stored_len(),
            table.deletions(),
        )
    }

    // == Reclaimer Control ==
    /// Runs one reclaimer cycle (sweep plus compaction check) right now.
    pub fn sweep_now(&self) -> SweepReport {
        reclaim_cycle(&self.shared)
    }

    /// Stops the background reclaimer. Lazy expiry keeps reads correct.
    pub fn shutdown(&self) {
        self.shared.shutdown_tx.send_replace(true);
    }

    /// Returns true while the background reclaimer is alive.
    pub fn is_reclaimer_running(&self) -> bool {
        self.shared
            .reclaimer
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
