//! telemetry/mod.rs
//! Protocol counters and immutable snapshots.
//!
//! Notes:
//! - Counters are plain integers owned by one handler; no atomics, no locks.
//! - Handlers for different channels can be merged into one view with `merge`.
//! - Snapshots are serde-friendly for export to logs or dashboards.

pub mod counters;
pub mod snapshot;

pub use counters::*;
pub use snapshot::*;
