use adsift::config::SyncConfig;
use adsift::db::{DbRecord, RecordStatus};
use adsift::error::DeliveryError;
use adsift::sync::{Consumer, HttpConsumer};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use url::Url;

#[derive(Clone)]
struct AppState {
    accept_status: StatusCode,
    seen: mpsc::UnboundedSender<serde_json::Value>,
}

async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, &'static str) {
    let _ = state.seen.send(body);
    (state.accept_status, "ok")
}

async fn health() -> &'static str {
    "ok"
}

async fn spawn_consumer_service(
    accept_status: StatusCode,
) -> (SocketAddr, mpsc::UnboundedReceiver<serde_json::Value>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/health", get(health))
        .with_state(AppState {
            accept_status,
            seen: tx,
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, rx)
}

fn consumer_for(addr: SocketAddr) -> HttpConsumer {
    HttpConsumer::new(&SyncConfig {
        consumer_url: Url::parse(&format!("http://{addr}")).unwrap(),
        api_key: Some("test-key".to_string()),
        deliver_timeout_secs: 5,
        health_timeout_secs: 2,
        ..SyncConfig::default()
    })
}

fn record() -> DbRecord {
    DbRecord {
        id: 7,
        title: "New Phone Launch".to_string(),
        url: "https://www.youtube.com/watch?v=abc123".to_string(),
        note: Some("Apify confirmed ad".to_string()),
        source_query: "advertisement commercial".to_string(),
        source_name: "Apify".to_string(),
        collected_at: Utc::now(),
        analyzed_at: None,
        status: RecordStatus::Pending,
    }
}

#[tokio::test]
async fn test_deliver_posts_payload_and_accepts_202() {
    let (addr, mut seen) = spawn_consumer_service(StatusCode::ACCEPTED).await;
    let consumer = consumer_for(addr);

    consumer.deliver(&record()).await.unwrap();

    let payload = seen.recv().await.expect("consumer service saw one request");
    assert_eq!(payload["id"], 7);
    assert_eq!(payload["title"], "New Phone Launch");
    assert_eq!(payload["url"], "https://www.youtube.com/watch?v=abc123");
    assert_eq!(payload["note"], "Apify confirmed ad");
    assert_eq!(payload["source"], "adsift");
    assert!(payload["collected_at"].is_string());
}

#[tokio::test]
async fn test_deliver_is_rejected_on_error_status() {
    let (addr, _seen) = spawn_consumer_service(StatusCode::BAD_REQUEST).await;
    let consumer = consumer_for(addr);

    let err = consumer.deliver(&record()).await.unwrap_err();
    match err {
        DeliveryError::Rejected { status, .. } => assert_eq!(status, StatusCode::BAD_REQUEST),
        DeliveryError::Http(e) => panic!("expected rejection, got transport error: {e}"),
    }
}

#[tokio::test]
async fn test_health_check_reflects_reachability() {
    let (addr, _seen) = spawn_consumer_service(StatusCode::OK).await;
    let consumer = consumer_for(addr);
    assert!(consumer.health_check().await);

    // A released port refuses connections: probe is false, delivery errors.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);

    let dead_consumer = consumer_for(dead_addr);
    assert!(!dead_consumer.health_check().await);
    assert!(matches!(
        dead_consumer.deliver(&record()).await,
        Err(DeliveryError::Http(_))
    ));
}
