//! TTL KV soak runner
//!
//! Owns one expiring store and hammers it with short-lived keys from a set
//! of worker tasks, logging store statistics once per second.

use std::env;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinSet;
use tokio::time::{interval, Instant};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_kv::{ExpiringStore, StoreConfig};

/// Workload parameters for the soak run.
#[derive(Debug, Clone)]
struct SoakConfig {
    /// Concurrent writer/reader tasks
    workers: usize,
    /// Distinct keys each worker cycles through
    keyspace: usize,
    /// TTL of keys written by the workers
    entry_ttl: Duration,
    /// Stop after this long; zero runs until a signal arrives
    run_for: Duration,
}

impl SoakConfig {
    /// # Environment Variables
    /// - `SOAK_WORKERS` - Worker tasks (default: 4)
    /// - `SOAK_KEYSPACE` - Keys per worker (default: 10000)
    /// - `SOAK_ENTRY_TTL_MS` - TTL of written keys (default: 250)
    /// - `SOAK_SECONDS` - Run time in seconds, 0 = until Ctrl+C (default: 10)
    fn from_env() -> Self {
        Self {
            workers: env_parse("SOAK_WORKERS").unwrap_or(4),
            keyspace: env_parse("SOAK_KEYSPACE").unwrap_or(10_000),
            entry_ttl: Duration::from_millis(env_parse("SOAK_ENTRY_TTL_MS").unwrap_or(250)),
            run_for: Duration::from_secs(env_parse("SOAK_SECONDS").unwrap_or(10)),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_kv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store_config = StoreConfig::from_env();
    let soak = SoakConfig::from_env();
    info!(
        "Configuration loaded: default_ttl={:?}, sweep_interval={:?}, workers={}, keyspace={}",
        store_config.default_ttl,
        store_config.sweep_interval(),
        soak.workers,
        soak.keyspace
    );

    let store: ExpiringStore<u64> = ExpiringStore::with_config(store_config);

    let mut workers = JoinSet::new();
    for worker in 0..soak.workers {
        workers.spawn(run_worker(store.clone(), worker, soak.clone()));
    }
    info!("Started {} workers", soak.workers);

    let mut report = interval(Duration::from_secs(1));
    let deadline = soak_deadline(Instant::now(), soak.run_for);
    let finished = sleep_until_deadline(deadline);
    let shutdown = shutdown_signal();
    tokio::pin!(finished, shutdown);

    loop {
        tokio::select! {
            _ = report.tick() => {
                let stats = serde_json::to_string(&store.stats())
                    .context("Failed to serialize store stats")?;
                info!("stats {}", stats);
            }
            _ = &mut finished => {
                info!("Soak run finished after {:?}", soak.run_for);
                break;
            }
            _ = &mut shutdown => break,
        }
    }

    workers.abort_all();
    while workers.join_next().await.is_some() {}
    store.shutdown();

    let stats = store.stats();
    info!(
        "Final: hits={}, misses={}, hit_rate={:.3}, expired_removed={}, compactions={}, capacity={}",
        stats.hits,
        stats.misses,
        stats.hit_rate(),
        stats.expired_removed,
        stats.compactions,
        store.capacity()
    );
    Ok(())
}

/// One worker: set-if-absent, read back, and occasionally delete.
async fn run_worker(store: ExpiringStore<u64>, worker: usize, soak: SoakConfig) {
    let mut counter: u64 = 0;
    loop {
        for _ in 0..256 {
            let key = format!("w{}:{}", worker, counter % soak.keyspace.max(1) as u64);
            if !store.set_if_absent(key.clone(), counter, soak.entry_ttl) && counter % 7 == 0 {
                store.set(key.clone(), counter, soak.entry_ttl);
            }
            let _ = store.get(&key);
            if counter % 5 == 0 {
                store.delete(&key);
            }
            counter = counter.wrapping_add(1);
        }
        tokio::task::yield_now().await;
    }
}

/// Deadline of the soak run; `None` runs until a signal arrives.
fn soak_deadline(start: Instant, run_for: Duration) -> Option<Instant> {
    if run_for.is_zero() {
        return None;
    }
    start.checked_add(run_for)
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
