use adsift::collector::Collector;
use adsift::config::CollectConfig;
use adsift::db::{Candidate, StoreHandle};
use adsift::error::SourceError;
use adsift::sources::SourceClient;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::sync::watch;

fn temp_database(tag: &str) -> (String, PathBuf) {
    let tmp_dir = std::env::temp_dir();
    let mut hasher = DefaultHasher::new();
    SystemTime::now().hash(&mut hasher);
    tag.hash(&mut hasher);
    let db_file_name = format!("adsift_collector_test_{}_{}.sqlite", tag, hasher.finish());
    let db_path = tmp_dir.join(db_file_name);
    let database_url = format!("sqlite:{}", db_path.to_str().unwrap());
    (database_url, db_path)
}

async fn cleanup(db_path: &PathBuf) {
    let wal_path = PathBuf::from(format!("{}-wal", db_path.to_string_lossy()));
    let shm_path = PathBuf::from(format!("{}-shm", db_path.to_string_lossy()));
    let _ = fs::remove_file(&wal_path).await;
    let _ = fs::remove_file(&shm_path).await;
    fs::remove_file(db_path).await.unwrap();
}

fn candidate(url: &str) -> Candidate {
    Candidate {
        title: format!("Ad {url}"),
        url: url.to_string(),
        note: None,
    }
}

/// Scripted source: pops one batch per call, then keeps returning empty
/// success.
struct StubSource {
    name: &'static str,
    cooldown: Duration,
    calls: AtomicUsize,
    batches: Mutex<VecDeque<Result<Vec<Candidate>, SourceError>>>,
}

impl StubSource {
    fn new(
        name: &'static str,
        cooldown: Duration,
        batches: Vec<Result<Vec<Candidate>, SourceError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            cooldown,
            calls: AtomicUsize::new(0),
            batches: Mutex::new(batches.into()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceClient for StubSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn cooldown(&self) -> Duration {
        self.cooldown
    }

    async fn search(&self, _query: &str, _limit: u32) -> Result<Vec<Candidate>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Vec::new()))
    }
}

fn collect_cfg(queries: &[&str]) -> CollectConfig {
    CollectConfig {
        queries: queries.iter().map(|q| (*q).to_string()).collect(),
        per_query_limit: 10,
        source_delay_ms: 0,
        interval_mins: 30,
    }
}

fn collector(store: &StoreHandle, sources: Vec<Arc<StubSource>>, queries: &[&str]) -> Collector {
    let sources = sources
        .into_iter()
        .map(|source| source as Arc<dyn SourceClient>)
        .collect();
    Collector::new(store.clone(), sources, collect_cfg(queries))
}

#[tokio::test]
async fn test_counters_and_cross_source_dedup() {
    let (database_url, db_path) = temp_database("counters");
    let store = adsift::db::spawn(&database_url).await;

    let source_a = StubSource::new(
        "SrcA",
        Duration::from_secs(3600),
        vec![Ok(vec![candidate("u1"), candidate("u2")])],
    );
    let source_b = StubSource::new(
        "SrcB",
        Duration::from_secs(3600),
        vec![Ok(vec![candidate("u2"), candidate("u3")])],
    );

    let collector = collector(
        &store,
        vec![source_a.clone(), source_b.clone()],
        &["q1"],
    );
    let (_tx, mut shutdown) = watch::channel(false);
    let summary = collector.collect(&mut shutdown).await.unwrap();

    assert_eq!(summary.total_collected, 4);
    assert_eq!(summary.new_records, 3, "u2 must dedup across sources");
    assert_eq!(summary.skipped_queries, 0);
    assert_eq!(summary.per_source.get("SrcA"), Some(&2));
    assert_eq!(summary.per_source.get("SrcB"), Some(&2));
    assert!(summary.new_records <= summary.total_collected);
    assert_eq!(
        summary.per_source.values().sum::<u64>(),
        summary.total_collected
    );

    let stats = store.get_statistics().await.unwrap();
    assert_eq!(stats.total_records, 3);

    cleanup(&db_path).await;
}

#[tokio::test]
async fn test_cooldown_skips_source_without_calling_it() {
    let (database_url, db_path) = temp_database("skip");
    let store = adsift::db::spawn(&database_url).await;

    let source = StubSource::new(
        "SrcA",
        Duration::from_secs(3600),
        vec![Ok(vec![candidate("u1")])],
    );
    let collector = collector(&store, vec![source.clone()], &["q1"]);
    let (_tx, mut shutdown) = watch::channel(false);

    let first = collector.collect(&mut shutdown).await.unwrap();
    assert_eq!(first.total_collected, 1);
    assert_eq!(source.calls(), 1);

    // Within the cooldown window the source must not even be contacted.
    let second = collector.collect(&mut shutdown).await.unwrap();
    assert_eq!(source.calls(), 1);
    assert_eq!(second.total_collected, 0);
    assert_eq!(second.skipped_queries, 1);

    cleanup(&db_path).await;
}

#[tokio::test]
async fn test_source_failure_does_not_consume_cooldown() {
    let (database_url, db_path) = temp_database("failure");
    let store = adsift::db::spawn(&database_url).await;

    let source = StubSource::new(
        "SrcA",
        Duration::from_secs(3600),
        vec![
            Err(SourceError::Upstream("boom".to_string())),
            Ok(vec![candidate("u1")]),
        ],
    );
    let collector = collector(&store, vec![source.clone()], &["q1"]);
    let (_tx, mut shutdown) = watch::channel(false);

    let first = collector.collect(&mut shutdown).await.unwrap();
    assert_eq!(first.total_collected, 0);
    assert_eq!(first.skipped_queries, 1);
    assert_eq!(source.calls(), 1);

    // The failed attempt left no history, so the pair is due immediately.
    assert!(
        store
            .should_collect("q1", "SrcA", Duration::from_secs(3600))
            .await
            .unwrap()
    );

    let second = collector.collect(&mut shutdown).await.unwrap();
    assert_eq!(source.calls(), 2);
    assert_eq!(second.total_collected, 1);
    assert_eq!(second.new_records, 1);

    cleanup(&db_path).await;
}

#[tokio::test]
async fn test_empty_success_still_consumes_cooldown() {
    let (database_url, db_path) = temp_database("empty");
    let store = adsift::db::spawn(&database_url).await;

    let source = StubSource::new("SrcA", Duration::from_secs(3600), vec![Ok(Vec::new())]);
    let collector = collector(&store, vec![source.clone()], &["q1"]);
    let (_tx, mut shutdown) = watch::channel(false);

    let first = collector.collect(&mut shutdown).await.unwrap();
    assert_eq!(first.total_collected, 0);
    assert_eq!(first.skipped_queries, 1);
    assert_eq!(source.calls(), 1);

    // "Nothing new" is a completed attempt, unlike a failure.
    let second = collector.collect(&mut shutdown).await.unwrap();
    assert_eq!(source.calls(), 1);
    assert_eq!(second.skipped_queries, 1);

    cleanup(&db_path).await;
}

#[tokio::test]
async fn test_one_failing_source_does_not_skip_the_query() {
    let (database_url, db_path) = temp_database("mixed");
    let store = adsift::db::spawn(&database_url).await;

    let failing = StubSource::new(
        "SrcA",
        Duration::from_secs(3600),
        vec![Err(SourceError::Upstream("boom".to_string()))],
    );
    let working = StubSource::new(
        "SrcB",
        Duration::from_secs(3600),
        vec![Ok(vec![candidate("u1")])],
    );

    let collector = collector(&store, vec![failing, working], &["q1"]);
    let (_tx, mut shutdown) = watch::channel(false);
    let summary = collector.collect(&mut shutdown).await.unwrap();

    assert_eq!(summary.total_collected, 1);
    assert_eq!(summary.skipped_queries, 0);
    assert_eq!(summary.per_source.get("SrcB"), Some(&1));
    assert_eq!(summary.per_source.get("SrcA"), None);

    cleanup(&db_path).await;
}

#[tokio::test]
async fn test_queries_run_in_order_across_sources() {
    let (database_url, db_path) = temp_database("queries");
    let store = adsift::db::spawn(&database_url).await;

    let source = StubSource::new(
        "SrcA",
        Duration::from_secs(3600),
        vec![
            Ok(vec![candidate("u1")]),
            Err(SourceError::Upstream("boom".to_string())),
        ],
    );
    let collector = collector(&store, vec![source.clone()], &["q1", "q2"]);
    let (_tx, mut shutdown) = watch::channel(false);
    let summary = collector.collect(&mut shutdown).await.unwrap();

    assert_eq!(source.calls(), 2);
    assert_eq!(summary.total_collected, 1);
    assert_eq!(summary.new_records, 1);
    assert_eq!(summary.skipped_queries, 1, "only q2 is skipped");

    // q1 consumed its cooldown, q2 did not.
    assert!(
        !store
            .should_collect("q1", "SrcA", Duration::from_secs(3600))
            .await
            .unwrap()
    );
    assert!(
        store
            .should_collect("q2", "SrcA", Duration::from_secs(3600))
            .await
            .unwrap()
    );

    cleanup(&db_path).await;
}

#[tokio::test]
async fn test_shutdown_stops_between_items() {
    let (database_url, db_path) = temp_database("shutdown");
    let store = adsift::db::spawn(&database_url).await;

    let source = StubSource::new(
        "SrcA",
        Duration::from_secs(3600),
        vec![Ok(vec![candidate("u1")])],
    );
    let collector = collector(&store, vec![source.clone()], &["q1", "q2", "q3"]);

    let (tx, mut shutdown) = watch::channel(true);
    drop(tx);
    let summary = collector.collect(&mut shutdown).await.unwrap();
    assert_eq!(summary.total_collected, 0);
    assert_eq!(source.calls(), 0, "an already-stopped pass contacts nothing");

    cleanup(&db_path).await;
}
