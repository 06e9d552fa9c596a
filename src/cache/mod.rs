//! Cache Module
//!
//! Provides the in-memory expiring store with lazy TTL checks, background
//! reclamation and amortized compaction.

mod compaction;
mod stats;
mod store;
mod table;


// Re-export public types
pub use compaction::CompactionPolicy;
pub use stats::StoreStats;
pub use store::ExpiringStore;

pub(crate) use stats::StatsCounters;
pub(crate) use store::Shared;
pub(crate) use table::ExpiryTable;
