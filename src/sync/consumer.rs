use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::SyncConfig;
use crate::db::DbRecord;
use crate::error::DeliveryError;
use crate::sources::retry::body_preview;

/// The external analysis service. Deliveries and health probes both carry
/// explicit timeouts; a timeout is an ordinary `DeliveryError`.
#[async_trait]
pub trait Consumer: Send + Sync {
    async fn deliver(&self, record: &DbRecord) -> Result<(), DeliveryError>;

    async fn health_check(&self) -> bool;
}

/// HTTP consumer posting records to `<base>/api/analyze` and probing
/// `<base>/api/health`.
pub struct HttpConsumer {
    client: reqwest::Client,
    analyze_url: Url,
    health_url: Url,
    api_key: Option<String>,
    health_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct AnalyzePayload<'a> {
    id: i64,
    title: &'a str,
    url: &'a str,
    note: Option<&'a str>,
    collected_at: DateTime<Utc>,
    source: &'static str,
}

impl HttpConsumer {
    pub fn new(cfg: &SyncConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("adsift/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(cfg.deliver_timeout())
            .build()
            .expect("FATAL: initialize consumer HTTP client failed");

        let mut base = cfg.consumer_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        Self {
            client,
            analyze_url: base.join("api/analyze").expect("valid analyze endpoint"),
            health_url: base.join("api/health").expect("valid health endpoint"),
            api_key: cfg.api_key.clone(),
            health_timeout: cfg.health_timeout(),
        }
    }
}

#[async_trait]
impl Consumer for HttpConsumer {
    async fn deliver(&self, record: &DbRecord) -> Result<(), DeliveryError> {
        let payload = AnalyzePayload {
            id: record.id,
            title: &record.title,
            url: &record.url,
            note: record.note.as_deref(),
            collected_at: record.collected_at,
            source: "adsift",
        };

        let mut request = self.client.post(self.analyze_url.clone()).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await?;
        let status = resp.status();

        // 200/201/202 all count as accepted.
        if matches!(status.as_u16(), 200..=202) {
            debug!(record_id = record.id, %status, "record accepted by consumer");
            return Ok(());
        }

        let body = body_preview(resp).await;
        Err(DeliveryError::Rejected { status, body })
    }

    async fn health_check(&self) -> bool {
        let mut request = self
            .client
            .get(self.health_url.clone())
            .timeout(self.health_timeout);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(resp) if resp.status() == reqwest::StatusCode::OK => true,
            Ok(resp) => {
                warn!(status = %resp.status(), "consumer health probe returned non-OK status");
                false
            }
            Err(e) => {
                warn!(error = %e, "consumer health probe failed");
                false
            }
        }
    }
}
