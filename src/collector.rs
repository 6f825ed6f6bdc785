//! The collection pass: drives every configured source for every configured
//! query, throttled per (query, source) pair, and hands candidate batches to
//! the store for dedup and enqueueing.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::CollectConfig;
use crate::db::StoreHandle;
use crate::error::StoreError;
use crate::sources::SourceClient;

/// Machine-readable result of one collection pass. `new_records` never exceeds
/// `total_collected`, and the per-source counts sum to `total_collected`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectSummary {
    pub total_collected: u64,
    pub new_records: u64,
    pub per_source: BTreeMap<String, u64>,
    pub skipped_queries: u64,
}

pub struct Collector {
    store: StoreHandle,
    sources: Vec<Arc<dyn SourceClient>>,
    cfg: CollectConfig,
}

impl Collector {
    pub fn new(store: StoreHandle, sources: Vec<Arc<dyn SourceClient>>, cfg: CollectConfig) -> Self {
        Self {
            store,
            sources,
            cfg,
        }
    }

    /// One pass over all configured queries. Source failures are logged and
    /// skipped without consuming the cooldown; store failures abort the pass.
    /// The shutdown signal takes effect between source invocations.
    pub async fn collect(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<CollectSummary, StoreError> {
        let mut summary = CollectSummary::default();

        info!(queries = self.cfg.queries.len(), sources = self.sources.len(), "collection pass starting");

        'queries: for query in &self.cfg.queries {
            let mut collected_this_query: u64 = 0;

            for source in &self.sources {
                if *shutdown.borrow() {
                    info!("collection pass interrupted by shutdown");
                    break 'queries;
                }

                let due = self
                    .store
                    .should_collect(query, source.name(), source.cooldown())
                    .await?;
                if !due {
                    info!(query, source = source.name(), "cooldown active, skipping fetch");
                    continue;
                }

                match source.search(query, self.cfg.per_query_limit).await {
                    Ok(candidates) => {
                        let found = candidates.len() as u64;
                        let new = self.store.save_records(candidates, query, source.name()).await?;

                        summary.total_collected += found;
                        summary.new_records += new;
                        *summary
                            .per_source
                            .entry(source.name().to_string())
                            .or_default() += found;
                        collected_this_query += found;

                        info!(query, source = source.name(), found, new, "source batch saved");
                    }
                    Err(e) => {
                        // Fetch history stays untouched so the next pass may retry
                        // before the cooldown would otherwise allow.
                        warn!(query, source = source.name(), error = %e, "source fetch failed");
                    }
                }

                sleep_interruptible(self.cfg.source_delay(), shutdown).await;
            }

            if collected_this_query == 0 {
                summary.skipped_queries += 1;
            }
        }

        Ok(summary)
    }

    /// Recurring collection loop: one pass immediately, then one per
    /// configured interval, until the shutdown signal flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(self.cfg.interval());
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("collector stopping");
                        break;
                    }
                    continue;
                }
                _ = tick.tick() => {}
            }

            match self.collect(&mut shutdown).await {
                Ok(summary) => info!(
                    total = summary.total_collected,
                    new = summary.new_records,
                    skipped = summary.skipped_queries,
                    "collection pass finished"
                ),
                Err(e) => error!(error = %e, "collection pass aborted"),
            }
        }
    }
}

/// Sleep that wakes early when the shutdown signal changes.
pub(crate) async fn sleep_interruptible(dur: Duration, shutdown: &mut watch::Receiver<bool>) {
    tokio::select! {
        () = tokio::time::sleep(dur) => {}
        _ = shutdown.changed() => {}
    }
}
