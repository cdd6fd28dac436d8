//! View counters for flatblog.
//!
//! Each post owns a small JSON record under `stats/<id>` holding its view
//! count. Page views are far too frequent to rewrite that record each time,
//! so [`StatsStore::record_view`] only enqueues the event. A single
//! background [`ViewCoalescer`] tallies events in memory and, on a fixed
//! timer, adds each tally to the persisted counter.
//!
//! Reads see only flushed views. A view recorded and read back immediately
//! may or may not be counted yet.

pub mod coalescer;
pub mod error;
pub mod files;
pub mod store;

pub use coalescer::{CoalescerConfig, CoalescerHandle, ViewCoalescer};
pub use error::{StatsError, StatsResult};
pub use files::StatsFiles;
pub use store::StatsStore;
