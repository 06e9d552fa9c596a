//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a store.
//!
//! # Tasks
//! - TTL Reclaimer: removes expired entries on a fixed interval and
//!   compacts the backing maps when deletions pile up

mod reclaimer;

pub use reclaimer::SweepReport;
pub(crate) use reclaimer::{reclaim_cycle, spawn_reclaimer, ReclaimerHandle};
