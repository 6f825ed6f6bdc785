use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use adsift::collector::Collector;
use adsift::report::StatusReport;
use adsift::sources::{ApifySource, SerpApiSource, SourceClient};
use adsift::sync::{HttpConsumer, SyncService};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const STARTUP_SYNC_LOG_LIMIT: i64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = adsift::config::Config::from_optional_toml();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        queries = cfg.collect.queries.len(),
        consumer_url = %cfg.sync.consumer_url,
        apify_enabled = cfg.sources.apify.enabled(),
        serp_enabled = cfg.sources.serp.enabled(),
    );

    let store = adsift::db::spawn(&cfg.basic.database_url).await;

    let mut sources: Vec<Arc<dyn SourceClient>> = Vec::new();
    if cfg.sources.apify.enabled() {
        sources.push(Arc::new(ApifySource::new(cfg.sources.apify.clone())));
    }
    if cfg.sources.serp.enabled() {
        sources.push(Arc::new(SerpApiSource::new(cfg.sources.serp.clone())));
    }
    if sources.is_empty() {
        warn!("no source clients configured; collection passes will find nothing");
    }

    let report = StatusReport::gather(&store, STARTUP_SYNC_LOG_LIMIT).await?;
    report.log_summary();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let collector = Collector::new(store.clone(), sources, cfg.collect.clone());
    let consumer = Arc::new(HttpConsumer::new(&cfg.sync));
    let sync = SyncService::new(store.clone(), consumer, cfg.sync.clone());

    let collector_rx = shutdown_rx.clone();
    let sync_rx = shutdown_rx;
    let collector_task = tokio::spawn(async move { collector.run(collector_rx).await });
    let sync_task = tokio::spawn(async move { sync.run(sync_rx).await });

    let _ = tokio::join!(collector_task, sync_task);

    let report = StatusReport::gather(&store, STARTUP_SYNC_LOG_LIMIT).await?;
    report.log_summary();
    info!("adsift has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { /* ... */ },
        _ = terminate => { /* ... */ },
    }
}
