//! Database module: the store owning all persisted pipeline state.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows, plus status enums
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `actor.rs`: the store actor; all reads and writes go through its handle

pub mod actor;
pub mod models;
pub mod schema;

pub use models::{
    Candidate, DbFetchHistory, DbQueueItem, DbRecord, DbSyncLogEntry, NewSyncLog, QueueStatus,
    RecordStatus, Statistics,
};
pub use schema::SQLITE_INIT;

pub use actor::{StoreHandle, StoreMessage, spawn};
