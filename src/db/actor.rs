use crate::db::models::{
    Candidate, DbRecord, DbSyncLogEntry, NewSyncLog, QueueStatus, RecordStatus, Statistics,
};
use crate::db::schema::SQLITE_INIT;
use crate::error::StoreError;
use crate::throttle;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info};

const DEFAULT_QUEUE_PRIORITY: i64 = 1;

#[derive(Debug)]
pub enum StoreMessage {
    /// Is a fetch for (query, source_name) due under the given cooldown?
    ShouldCollect(String, String, Duration, RpcReplyPort<Result<bool, StoreError>>),

    /// Dedup-insert a candidate batch, enqueue new records, upsert fetch
    /// history. Replies with the number of newly inserted records.
    SaveRecords(Vec<Candidate>, String, String, RpcReplyPort<Result<u64, StoreError>>),

    /// Pending records, newest first, bounded by the limit.
    GetPending(i64, RpcReplyPort<Result<Vec<DbRecord>, StoreError>>),

    /// Apply an analysis outcome to a record and its queue item.
    UpdateStatus(
        i64,
        RecordStatus,
        Option<String>,
        RpcReplyPort<Result<(), StoreError>>,
    ),

    /// Aggregate counts over all records.
    GetStatistics(RpcReplyPort<Result<Statistics, StoreError>>),

    /// Append one sync_log row.
    LogSync(NewSyncLog, RpcReplyPort<Result<(), StoreError>>),

    /// Most recent sync_log rows, newest first.
    RecentSyncLog(i64, RpcReplyPort<Result<Vec<DbSyncLogEntry>, StoreError>>),
}

#[derive(Clone)]
pub struct StoreHandle {
    actor: ActorRef<StoreMessage>,
}

impl StoreHandle {
    pub async fn should_collect(
        &self,
        query: &str,
        source_name: &str,
        cooldown: Duration,
    ) -> Result<bool, StoreError> {
        ractor::call!(
            self.actor,
            StoreMessage::ShouldCollect,
            query.to_string(),
            source_name.to_string(),
            cooldown
        )
        .map_err(|e| StoreError::Rpc(format!("Store ShouldCollect RPC failed: {e}")))?
    }

    pub async fn save_records(
        &self,
        candidates: Vec<Candidate>,
        query: &str,
        source_name: &str,
    ) -> Result<u64, StoreError> {
        ractor::call!(
            self.actor,
            StoreMessage::SaveRecords,
            candidates,
            query.to_string(),
            source_name.to_string()
        )
        .map_err(|e| StoreError::Rpc(format!("Store SaveRecords RPC failed: {e}")))?
    }

    pub async fn get_pending(&self, limit: i64) -> Result<Vec<DbRecord>, StoreError> {
        ractor::call!(self.actor, StoreMessage::GetPending, limit)
            .map_err(|e| StoreError::Rpc(format!("Store GetPending RPC failed: {e}")))?
    }

    pub async fn update_status(
        &self,
        record_id: i64,
        status: RecordStatus,
        error_message: Option<String>,
    ) -> Result<(), StoreError> {
        ractor::call!(
            self.actor,
            StoreMessage::UpdateStatus,
            record_id,
            status,
            error_message
        )
        .map_err(|e| StoreError::Rpc(format!("Store UpdateStatus RPC failed: {e}")))?
    }

    pub async fn get_statistics(&self) -> Result<Statistics, StoreError> {
        ractor::call!(self.actor, StoreMessage::GetStatistics)
            .map_err(|e| StoreError::Rpc(format!("Store GetStatistics RPC failed: {e}")))?
    }

    pub async fn log_sync(&self, entry: NewSyncLog) -> Result<(), StoreError> {
        ractor::call!(self.actor, StoreMessage::LogSync, entry)
            .map_err(|e| StoreError::Rpc(format!("Store LogSync RPC failed: {e}")))?
    }

    pub async fn recent_sync_log(&self, limit: i64) -> Result<Vec<DbSyncLogEntry>, StoreError> {
        ractor::call!(self.actor, StoreMessage::RecentSyncLog, limit)
            .map_err(|e| StoreError::Rpc(format!("Store RecentSyncLog RPC failed: {e}")))?
    }
}

struct StoreActorState {
    pool: SqlitePool,
}

struct StoreActor;

#[ractor::async_trait]
impl Actor for StoreActor {
    type Msg = StoreMessage;
    type State = StoreActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("StoreActor initialized");
        Ok(StoreActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            StoreMessage::ShouldCollect(query, source_name, cooldown, reply) => {
                let res = self
                    .should_collect(&state.pool, &query, &source_name, cooldown)
                    .await;
                let _ = reply.send(res);
            }
            StoreMessage::SaveRecords(candidates, query, source_name, reply) => {
                let res = self
                    .save_records(&state.pool, candidates, &query, &source_name)
                    .await;
                let _ = reply.send(res);
            }
            StoreMessage::GetPending(limit, reply) => {
                let res = self.get_pending(&state.pool, limit).await;
                let _ = reply.send(res);
            }
            StoreMessage::UpdateStatus(record_id, status, error_message, reply) => {
                let res = self
                    .update_status(&state.pool, record_id, status, error_message)
                    .await;
                let _ = reply.send(res);
            }
            StoreMessage::GetStatistics(reply) => {
                let res = self.get_statistics(&state.pool).await;
                let _ = reply.send(res);
            }
            StoreMessage::LogSync(entry, reply) => {
                let res = self.log_sync(&state.pool, entry).await;
                let _ = reply.send(res);
            }
            StoreMessage::RecentSyncLog(limit, reply) => {
                let res = self.recent_sync_log(&state.pool, limit).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl StoreActor {
    /// Read-only throttle check. History is written only by `save_records`,
    /// so a failed fetch attempt never consumes the cooldown window.
    async fn should_collect(
        &self,
        pool: &SqlitePool,
        query: &str,
        source_name: &str,
        cooldown: Duration,
    ) -> Result<bool, StoreError> {
        let last: Option<chrono::DateTime<Utc>> = sqlx::query_scalar(
            r#"
        SELECT last_collected_at FROM fetch_history
        WHERE query = ? AND source_name = ?
        "#,
        )
        .bind(query)
        .bind(source_name)
        .fetch_optional(pool)
        .await?;

        Ok(throttle::due(last, cooldown, Utc::now()))
    }

    /// One transaction: insert-or-skip each candidate by URL, enqueue every
    /// new record, then upsert the fetch history row exactly once (also for
    /// all-duplicate and empty batches).
    async fn save_records(
        &self,
        pool: &SqlitePool,
        candidates: Vec<Candidate>,
        query: &str,
        source_name: &str,
    ) -> Result<u64, StoreError> {
        let now = Utc::now();
        let batch_len = i64::try_from(candidates.len()).unwrap_or(i64::MAX);
        let mut new_count: u64 = 0;

        let mut tx = pool.begin().await?;

        for candidate in &candidates {
            if candidate.url.trim().is_empty() || candidate.title.trim().is_empty() {
                debug!(url = %candidate.url, "dropping blank candidate at store boundary");
                continue;
            }

            let inserted: Option<i64> = sqlx::query_scalar(
                r#"
            INSERT INTO records (title, url, note, source_query, source_name, collected_at, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            RETURNING id
            "#,
            )
            .bind(&candidate.title)
            .bind(&candidate.url)
            .bind(&candidate.note)
            .bind(query)
            .bind(source_name)
            .bind(now)
            .bind(RecordStatus::Pending)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(record_id) = inserted {
                sqlx::query(
                    r#"
                INSERT INTO queue_items (record_id, priority, created_at, status)
                VALUES (?, ?, ?, ?)
                "#,
                )
                .bind(record_id)
                .bind(DEFAULT_QUEUE_PRIORITY)
                .bind(now)
                .bind(QueueStatus::Waiting)
                .execute(&mut *tx)
                .await?;
                new_count += 1;
            }
        }

        sqlx::query(
            r#"
        INSERT INTO fetch_history (query, source_name, last_collected_at, total_found, success_count)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(query, source_name) DO UPDATE SET
            last_collected_at = excluded.last_collected_at,
            total_found = total_found + excluded.total_found,
            success_count = success_count + excluded.success_count
        "#,
        )
        .bind(query)
        .bind(source_name)
        .bind(now)
        .bind(batch_len)
        .bind(i64::try_from(new_count).unwrap_or(i64::MAX))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(new_count)
    }

    async fn get_pending(
        &self,
        pool: &SqlitePool,
        limit: i64,
    ) -> Result<Vec<DbRecord>, StoreError> {
        let rows = sqlx::query_as::<_, DbRecord>(
            r#"
        SELECT id, title, url, note, source_query, source_name, collected_at, analyzed_at, status
        FROM records
        WHERE status = ?
        ORDER BY collected_at DESC, id DESC
        LIMIT ?
        "#,
        )
        .bind(RecordStatus::Pending)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// One transaction updating the record and its queue mirror together.
    /// Terminal queue states are final: a differing status on a finalized
    /// record is ignored, re-applying the same status refreshes timestamps.
    async fn update_status(
        &self,
        pool: &SqlitePool,
        record_id: i64,
        status: RecordStatus,
        error_message: Option<String>,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let target = QueueStatus::from(status);

        let mut tx = pool.begin().await?;

        let current: Option<QueueStatus> =
            sqlx::query_scalar("SELECT status FROM queue_items WHERE record_id = ?")
                .bind(record_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(current) = current else {
            return Err(StoreError::NotFound { record_id });
        };

        if current.is_terminal() && current != target {
            debug!(
                record_id,
                current = ?current,
                requested = ?target,
                "ignoring status change on finalized record"
            );
            return Ok(());
        }

        let updated = sqlx::query("UPDATE records SET status = ?, analyzed_at = ? WHERE id = ?")
            .bind(status)
            .bind(now)
            .bind(record_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(StoreError::NotFound { record_id });
        }

        sqlx::query(
            r#"
        UPDATE queue_items
        SET status = ?, processed_at = ?, error_message = ?
        WHERE record_id = ?
        "#,
        )
        .bind(target)
        .bind(now)
        .bind(&error_message)
        .bind(record_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_statistics(&self, pool: &SqlitePool) -> Result<Statistics, StoreError> {
        let mut stats = Statistics {
            total_records: sqlx::query_scalar("SELECT COUNT(*) FROM records")
                .fetch_one(pool)
                .await?,
            ..Statistics::default()
        };

        let by_status: Vec<(RecordStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM records GROUP BY status")
                .fetch_all(pool)
                .await?;
        for (status, count) in by_status {
            match status {
                RecordStatus::Pending => stats.pending = count,
                RecordStatus::Completed => stats.completed = count,
                RecordStatus::Failed => stats.failed = count,
            }
        }

        let by_source: Vec<(String, i64)> =
            sqlx::query_as("SELECT source_name, COUNT(*) FROM records GROUP BY source_name")
                .fetch_all(pool)
                .await?;
        stats.per_source = by_source.into_iter().collect();

        stats.latest_collected_at = sqlx::query_scalar("SELECT MAX(collected_at) FROM records")
            .fetch_one(pool)
            .await?;

        Ok(stats)
    }

    async fn log_sync(&self, pool: &SqlitePool, entry: NewSyncLog) -> Result<(), StoreError> {
        sqlx::query(
            r#"
        INSERT INTO sync_log (sync_type, records_count, success, error_message, sync_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
        )
        .bind(&entry.sync_type)
        .bind(entry.records_count)
        .bind(entry.success)
        .bind(&entry.error_message)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn recent_sync_log(
        &self,
        pool: &SqlitePool,
        limit: i64,
    ) -> Result<Vec<DbSyncLogEntry>, StoreError> {
        let rows = sqlx::query_as::<_, DbSyncLogEntry>(
            r#"
        SELECT id, sync_type, records_count, success, error_message, sync_at
        FROM sync_log
        ORDER BY sync_at DESC, id DESC
        LIMIT ?
        "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}

/// Spawn the store actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> StoreHandle {
    let (actor, _jh) = ractor::Actor::spawn(
        None,
        StoreActor,
        database_url.to_string(),
    )
    .await
    .expect("failed to spawn StoreActor");

    StoreHandle { actor }
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
