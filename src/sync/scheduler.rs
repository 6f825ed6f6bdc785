use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::collector::sleep_interruptible;
use crate::config::SyncConfig;
use crate::db::{NewSyncLog, RecordStatus, StoreHandle};
use crate::error::StoreError;
use crate::sync::consumer::Consumer;

const SYNC_TYPE_BATCH: &str = "batch_send";

/// Machine-readable result of one sync batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub sent: u64,
    pub success: u64,
    pub failed: u64,
}

pub struct SyncService {
    store: StoreHandle,
    consumer: Arc<dyn Consumer>,
    cfg: SyncConfig,
}

enum Tick {
    Batch,
    Catchup,
    Health,
}

impl SyncService {
    pub fn new(store: StoreHandle, consumer: Arc<dyn Consumer>, cfg: SyncConfig) -> Self {
        Self {
            store,
            consumer,
            cfg,
        }
    }

    /// Drain up to `limit` pending records to the consumer. Deliveries are
    /// independent: one failure marks that record failed and the batch goes
    /// on. An empty cycle returns zeros and writes no sync-log entry. The
    /// shutdown signal takes effect between deliveries.
    pub async fn sync_batch(
        &self,
        limit: i64,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<SyncSummary, StoreError> {
        let pending = self.store.get_pending(limit).await?;
        if pending.is_empty() {
            debug!("no pending records to sync");
            return Ok(SyncSummary::default());
        }

        info!(pending = pending.len(), "sync batch starting");
        let mut summary = SyncSummary::default();

        for record in &pending {
            if *shutdown.borrow() {
                info!("sync batch interrupted by shutdown");
                break;
            }

            summary.sent += 1;
            match self.consumer.deliver(record).await {
                Ok(()) => {
                    self.store
                        .update_status(record.id, RecordStatus::Completed, None)
                        .await?;
                    summary.success += 1;
                }
                Err(e) => {
                    warn!(record_id = record.id, url = %record.url, error = %e, "delivery failed");
                    self.store
                        .update_status(record.id, RecordStatus::Failed, Some(e.to_string()))
                        .await?;
                    summary.failed += 1;
                }
            }

            sleep_interruptible(self.cfg.delivery_delay(), shutdown).await;
        }

        if summary.sent == 0 {
            return Ok(summary);
        }

        self.store
            .log_sync(NewSyncLog {
                sync_type: SYNC_TYPE_BATCH.to_string(),
                records_count: i64::try_from(summary.sent).unwrap_or(i64::MAX),
                success: summary.failed == 0,
                error_message: None,
            })
            .await?;

        info!(
            sent = summary.sent,
            success = summary.success,
            failed = summary.failed,
            "sync batch finished"
        );
        Ok(summary)
    }

    /// Timer loop: regular batches on a short interval, one large catch-up
    /// batch per catch-up interval, and an independent health probe whose
    /// failure makes the next scheduled batches skip without touching any
    /// record.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut batch_tick = tokio::time::interval_at(
            tokio::time::Instant::now() + self.cfg.interval(),
            self.cfg.interval(),
        );
        batch_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut catchup_tick = tokio::time::interval_at(
            tokio::time::Instant::now() + self.cfg.catchup_interval(),
            self.cfg.catchup_interval(),
        );
        catchup_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut health_tick = tokio::time::interval(self.cfg.health_interval());
        health_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut consumer_healthy = true;

        loop {
            let tick = tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("sync scheduler stopping");
                        break;
                    }
                    continue;
                }
                _ = batch_tick.tick() => Tick::Batch,
                _ = catchup_tick.tick() => Tick::Catchup,
                _ = health_tick.tick() => Tick::Health,
            };

            match tick {
                Tick::Batch => {
                    if !consumer_healthy {
                        warn!("skipping scheduled sync batch: consumer unhealthy");
                        continue;
                    }
                    match self.sync_batch(i64::from(self.cfg.batch_size), &mut shutdown).await {
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "sync batch aborted"),
                    }
                }
                Tick::Catchup => {
                    if !consumer_healthy {
                        warn!("skipping catch-up sync batch: consumer unhealthy");
                        continue;
                    }
                    info!(batch_size = self.cfg.catchup_batch_size, "daily catch-up sync");
                    match self
                        .sync_batch(i64::from(self.cfg.catchup_batch_size), &mut shutdown)
                        .await
                    {
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "catch-up sync batch aborted"),
                    }
                }
                Tick::Health => {
                    consumer_healthy = self.consumer.health_check().await;
                    if consumer_healthy {
                        debug!("consumer health probe ok");
                    } else {
                        warn!("consumer unreachable; scheduled batches will be skipped");
                    }
                }
            }
        }
    }
}
