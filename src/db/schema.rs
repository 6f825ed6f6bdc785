//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - `records` table (collected ad videos, one row per unique URL)
/// - `fetch_history` table (one row per (query, source_name) pair)
/// - `queue_items` table (analysis work queue, one row per record)
/// - `sync_log` table (append-only consumer sync audit trail)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Collected records (URL is the global dedup key)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    note TEXT NULL,
    source_query TEXT NOT NULL,
    source_name TEXT NOT NULL,
    collected_at TEXT NOT NULL, -- RFC3339
    analyzed_at TEXT NULL, -- RFC3339
    status TEXT NOT NULL DEFAULT 'pending' -- pending, completed, failed
);

CREATE INDEX IF NOT EXISTS idx_records_status ON records(status);
CREATE INDEX IF NOT EXISTS idx_records_collected_at ON records(collected_at);

-- ---------------------------------------------------------------------------
-- Fetch history (throttle bookkeeping, one row per (query, source_name))
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS fetch_history (
    id INTEGER PRIMARY KEY NOT NULL,
    query TEXT NOT NULL,
    source_name TEXT NOT NULL,
    last_collected_at TEXT NOT NULL, -- RFC3339
    total_found INTEGER NOT NULL DEFAULT 0,
    success_count INTEGER NOT NULL DEFAULT 0,
    UNIQUE(query, source_name)
);

-- ---------------------------------------------------------------------------
-- Analysis queue (exactly one item per record)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS queue_items (
    id INTEGER PRIMARY KEY NOT NULL,
    record_id INTEGER NOT NULL UNIQUE REFERENCES records(id),
    priority INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL, -- RFC3339
    processed_at TEXT NULL, -- RFC3339
    status TEXT NOT NULL DEFAULT 'waiting', -- waiting, processing, completed, failed
    error_message TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_queue_status ON queue_items(status);

-- ---------------------------------------------------------------------------
-- Consumer sync log (append-only)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sync_log (
    id INTEGER PRIMARY KEY NOT NULL,
    sync_type TEXT NOT NULL,
    records_count INTEGER NOT NULL,
    success INTEGER NOT NULL,
    error_message TEXT NULL,
    sync_at TEXT NOT NULL -- RFC3339
);
"#;
