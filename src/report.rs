//! Read-only reporting over the store; safe to call concurrently with the
//! collector and the sync scheduler.

use serde::Serialize;
use tracing::info;

use crate::db::{DbSyncLogEntry, Statistics, StoreHandle};
use crate::error::StoreError;

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub statistics: Statistics,
    pub recent_syncs: Vec<DbSyncLogEntry>,
}

impl StatusReport {
    pub async fn gather(store: &StoreHandle, sync_log_limit: i64) -> Result<Self, StoreError> {
        Ok(Self {
            statistics: store.get_statistics().await?,
            recent_syncs: store.recent_sync_log(sync_log_limit).await?,
        })
    }

    pub fn log_summary(&self) {
        info!(
            total = self.statistics.total_records,
            pending = self.statistics.pending,
            completed = self.statistics.completed,
            failed = self.statistics.failed,
            latest = %self
                .statistics
                .latest_collected_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "<none>".to_string()),
            "store status"
        );
        for (source, count) in &self.statistics.per_source {
            info!(source = %source, count, "records per source");
        }
        for entry in &self.recent_syncs {
            info!(
                sync_type = %entry.sync_type,
                records = entry.records_count,
                success = entry.success,
                at = %entry.sync_at.to_rfc3339(),
                "recent sync"
            );
        }
    }
}
