//! TTL KV - An in-process expiring key-value store
//!
//! Provides a concurrency-safe map with per-entry time-to-live, a background
//! reclaimer for expired entries and amortized compaction of the backing maps.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{ExpiringStore, StoreStats};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use tasks::SweepReport;
