pub mod collector;
pub mod config;
pub mod db;
pub mod error;
pub mod report;
pub mod sources;
pub mod sync;
pub mod throttle;

pub use collector::{CollectSummary, Collector};
pub use error::{DeliveryError, SourceError, StoreError};
pub use sync::{SyncService, SyncSummary};
