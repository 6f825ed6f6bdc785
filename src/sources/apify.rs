use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::ApifyConfig;
use crate::db::Candidate;
use crate::error::SourceError;
use crate::sources::retry::{body_preview, send_with_retry};
use crate::sources::{MAX_NOTE_CHARS, MAX_TITLE_CHARS, SourceClient, clamp, display_count};

pub const APIFY_SOURCE_NAME: &str = "Apify";

/// Bulk scraping provider: one synchronous actor run returns a dataset of
/// confirmed ad videos. Runs are slow, so the request timeout is generous and
/// the cooldown long (24h by default).
pub struct ApifySource {
    client: reqwest::Client,
    cfg: ApifyConfig,
}

impl ApifySource {
    pub fn new(cfg: ApifyConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("adsift/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(cfg.timeout())
            .build()
            .expect("FATAL: initialize Apify HTTP client failed");

        Self { client, cfg }
    }

    fn run_url(&self) -> String {
        format!(
            "{}/v2/acts/{}/run-sync-get-dataset-items",
            self.cfg.base_url.as_str().trim_end_matches('/'),
            self.cfg.actor
        )
    }
}

#[async_trait]
impl SourceClient for ApifySource {
    fn name(&self) -> &'static str {
        APIFY_SOURCE_NAME
    }

    fn cooldown(&self) -> Duration {
        self.cfg.cooldown()
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Candidate>, SourceError> {
        let url = self.run_url();
        let token = self.cfg.token.clone().unwrap_or_default();
        let body = serde_json::json!({ "max_ads": limit });

        debug!(source = APIFY_SOURCE_NAME, query, limit, "running ad scraper actor");
        let resp = send_with_retry(APIFY_SOURCE_NAME, || {
            self.client.post(&url).bearer_auth(&token).json(&body)
        })
        .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = body_preview(resp).await;
            return Err(SourceError::UpstreamStatus { status, body });
        }

        let bytes = resp.bytes().await.map_err(SourceError::Http)?;
        let items: Vec<ApifyItem> = serde_json::from_slice(&bytes)?;

        Ok(items.into_iter().filter_map(candidate_from_item).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ApifyItem {
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default, rename = "youtubeData")]
    youtube_data: Option<ApifyYoutubeData>,
    #[serde(default)]
    advertiser_id: Option<String>,
    #[serde(default, rename = "youtubeStatistics")]
    youtube_statistics: Option<ApifyYoutubeStatistics>,
}

#[derive(Debug, Deserialize)]
struct ApifyYoutubeData {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApifyYoutubeStatistics {
    #[serde(default, rename = "viewCount")]
    view_count: Option<serde_json::Value>,
}

fn candidate_from_item(item: ApifyItem) -> Option<Candidate> {
    let video_id = item.video_id.filter(|id| !id.is_empty())?;
    let title = item
        .youtube_data
        .and_then(|d| d.title)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())?;

    let mut note_parts = vec!["Apify confirmed ad".to_string()];
    if let Some(advertiser_id) = item.advertiser_id {
        note_parts.push(format!("advertiser: {advertiser_id}"));
    }
    if let Some(views) = item.youtube_statistics.and_then(|s| s.view_count) {
        note_parts.push(format!("views: {}", display_count(&views)));
    }

    Some(Candidate {
        title: clamp(&title, MAX_TITLE_CHARS),
        url: format!("https://www.youtube.com/watch?v={video_id}"),
        note: Some(clamp(&note_parts.join(" | "), MAX_NOTE_CHARS)),
    })
}
