use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Analysis lifecycle of a collected record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Completed,
    Failed,
}

/// Queue-side mirror of [`RecordStatus`]. Monotonic: once completed or failed,
/// an item never returns to waiting or processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum QueueStatus {
    Waiting,
    Processing,
    Completed,
    Failed,
}

impl QueueStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, QueueStatus::Completed | QueueStatus::Failed)
    }
}

impl From<RecordStatus> for QueueStatus {
    fn from(status: RecordStatus) -> Self {
        match status {
            RecordStatus::Pending => QueueStatus::Waiting,
            RecordStatus::Completed => QueueStatus::Completed,
            RecordStatus::Failed => QueueStatus::Failed,
        }
    }
}

/// Unvalidated item returned by a source client, not yet deduplicated.
/// Validated at the store boundary: blank titles and URLs are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub url: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbRecord {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub note: Option<String>,
    pub source_query: String,
    pub source_name: String,
    pub collected_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbFetchHistory {
    pub id: i64,
    pub query: String,
    pub source_name: String,
    pub last_collected_at: DateTime<Utc>,
    pub total_found: i64,
    pub success_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbQueueItem {
    pub id: i64,
    pub record_id: i64,
    pub priority: i64,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub status: QueueStatus,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbSyncLogEntry {
    pub id: i64,
    pub sync_type: String,
    pub records_count: i64,
    pub success: bool,
    pub error_message: Option<String>,
    pub sync_at: DateTime<Utc>,
}

/// Input shape for one append-only `sync_log` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSyncLog {
    pub sync_type: String,
    pub records_count: i64,
    pub success: bool,
    pub error_message: Option<String>,
}

/// Read-only aggregate over the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Statistics {
    pub total_records: i64,
    pub pending: i64,
    pub completed: i64,
    pub failed: i64,
    pub per_source: BTreeMap<String, i64>,
    pub latest_collected_at: Option<DateTime<Utc>>,
}
