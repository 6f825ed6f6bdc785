//! Consumer sync: delivery of queued records to the analysis service and the
//! timers that schedule it.

pub mod consumer;
pub mod scheduler;

pub use consumer::{Consumer, HttpConsumer};
pub use scheduler::{SyncService, SyncSummary};
