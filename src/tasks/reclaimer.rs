//! TTL Reclaimer Task
//!
//! Background task that periodically removes expired entries and compacts
//! the backing maps once enough garbage has accumulated.

use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use tokio::runtime::Builder;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::cache::Shared;

// == Sweep Report ==
/// Outcome of a single reclaimer cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired entries removed by the sweep
    pub removed: usize,
    /// Whether the backing maps were rebuilt afterwards
    pub compacted: bool,
}

/// Runs one sweep and the compaction tail step under a single exclusive guard.
pub(crate) fn reclaim_cycle<V>(shared: &Shared<V>) -> SweepReport {
    let report = {
        let mut table = shared.table.write();
        let removed = table.sweep_expired();
        let compacted = table.compact_if_needed(&shared.policy);
        SweepReport { removed, compacted }
    };

    shared.stats.record_expired(report.removed);
    if report.compacted {
        shared.stats.record_compaction();
    }
    report
}

// == Reclaimer Handle ==
/// Dedicated thread driving the reclaimer on its own current-thread runtime.
#[derive(Debug)]
pub(crate) struct ReclaimerHandle(thread::JoinHandle<()>);

impl ReclaimerHandle {
    pub(crate) fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

/// Starts the reclaimer for a store.
///
/// Always runs on its own thread, never on the caller's runtime, so the
/// sweep outlives whichever runtime built the store. The loop holds only a
/// weak reference and exits once the last store handle is dropped or
/// `shutdown` is signalled. Returns `None` if the thread could not be
/// created; the store then relies on lazy expiry and manual sweeps.
pub(crate) fn spawn_reclaimer<V>(shared: &Arc<Shared<V>>) -> Option<ReclaimerHandle>
where
    V: Send + Sync + 'static,
{
    let weak = Arc::downgrade(shared);
    let interval = shared.config.sweep_interval();
    let shutdown_rx = shared.shutdown_tx.subscribe();

    let spawned = thread::Builder::new()
        .name("ttl-kv-reclaimer".to_string())
        .spawn(move || {
            let runtime = match Builder::new_current_thread().enable_time().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("Failed to build reclaimer runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(run(weak, interval, shutdown_rx));
        });

    match spawned {
        Ok(handle) => Some(ReclaimerHandle(handle)),
        Err(err) => {
            error!("Failed to spawn reclaimer thread: {}", err);
            None
        }
    }
}

async fn run<V>(
    shared: Weak<Shared<V>>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the immediate first tick
    ticker.tick().await;

    info!("Starting TTL reclaimer with interval of {:?}", interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                let report = reclaim_cycle(&shared);

                if report.removed > 0 {
                    info!("TTL sweep: removed {} expired entries", report.removed);
                } else {
                    debug!("TTL sweep: no expired entries found");
                }
                if report.compacted {
                    info!("TTL sweep: compacted backing maps");
                }
            }
            changed = shutdown_rx.changed() => {
                // Err means every store handle is gone
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("TTL reclaimer stopped");
}

#[cfg(test)]
mod tests {
    use crate::cache::ExpiringStore;
    use crate::config::StoreConfig;
    use std::time::Duration;

    fn fast_store() -> ExpiringStore<String> {
        let config = StoreConfig::new(Duration::from_millis(100))
            .with_max_sweep_interval(Duration::from_millis(50));
        ExpiringStore::with_config(config)
    }

    #[tokio::test]
    async fn test_reclaimer_removes_expired_entries() {
        let store = fast_store();

        store.set("expire_soon", "value".to_string(), Duration::from_millis(20));

        // Wait for entry to expire and a sweep to run
        tokio::time::sleep(Duration::from_millis(300)).await;

        let stats = store.stats();
        assert_eq!(stats.stored_entries, 0, "Expired entry should have been reclaimed");
        assert_eq!(stats.expired_removed, 1);
        assert!(store.get("expire_soon").is_err());
    }

    #[tokio::test]
    async fn test_reclaimer_preserves_valid_entries() {
        let store = fast_store();

        store.set("long_lived", "value".to_string(), Duration::from_secs(3600));

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(store.get("long_lived").unwrap(), "value");
        assert_eq!(store.stats().expired_removed, 0);
    }

    #[tokio::test]
    async fn test_reclaimer_compacts_after_churn() {
        let config = StoreConfig::new(Duration::from_millis(50))
            .with_max_sweep_interval(Duration::from_millis(50))
            .with_compaction(10, 2);
        let store: ExpiringStore<u32> = ExpiringStore::with_config(config);

        for i in 0..500 {
            store.set(format!("key{}", i), i, Duration::from_millis(10));
        }

        tokio::time::sleep(Duration::from_millis(300)).await;

        let stats = store.stats();
        assert_eq!(stats.expired_removed, 500);
        assert!(stats.compactions >= 1);
        assert!(store.capacity() < 500);
    }

    #[tokio::test]
    async fn test_reclaimer_stops_on_shutdown() {
        let store = fast_store();
        assert!(store.is_reclaimer_running());

        store.shutdown();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!store.is_reclaimer_running(), "Reclaimer should stop after shutdown");
    }

    #[test]
    fn test_reclaimer_outlives_the_runtime_that_built_the_store() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let store: ExpiringStore<u32> = runtime.block_on(async {
            ExpiringStore::with_config(StoreConfig::new(Duration::from_millis(50)))
        });
        drop(runtime);

        for i in 0..100 {
            store.set(format!("key{}", i), i, Duration::from_millis(10));
        }
        std::thread::sleep(Duration::from_millis(500));

        assert!(store.is_reclaimer_running());
        let stats = store.stats();
        assert_eq!(stats.stored_entries, 0);
        assert_eq!(stats.expired_removed, 100);
    }

    #[test]
    fn test_reclaimer_runs_without_ambient_runtime() {
        let store = fast_store();
        assert!(store.is_reclaimer_running());

        store.set("expire_soon", "value".to_string(), Duration::from_millis(20));
        std::thread::sleep(Duration::from_millis(300));

        assert_eq!(store.stats().stored_entries, 0);

        store.shutdown();
        std::thread::sleep(Duration::from_millis(100));
        assert!(!store.is_reclaimer_running());
    }
}
