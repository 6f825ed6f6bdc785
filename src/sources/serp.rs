use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::SerpApiConfig;
use crate::db::Candidate;
use crate::error::SourceError;
use crate::sources::retry::{body_preview, send_with_retry};
use crate::sources::{MAX_NOTE_CHARS, MAX_TITLE_CHARS, SourceClient, clamp, display_count};

pub const SERPAPI_SOURCE_NAME: &str = "SerpAPI";

/// Search-engine-backed provider. Returns declared ad placements plus organic
/// results whose titles look ad-like per the configured keyword list.
pub struct SerpApiSource {
    client: reqwest::Client,
    cfg: SerpApiConfig,
}

impl SerpApiSource {
    pub fn new(cfg: SerpApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("adsift/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(cfg.timeout())
            .build()
            .expect("FATAL: initialize SerpAPI HTTP client failed");

        Self { client, cfg }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.cfg.base_url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl SourceClient for SerpApiSource {
    fn name(&self) -> &'static str {
        SERPAPI_SOURCE_NAME
    }

    fn cooldown(&self) -> Duration {
        self.cfg.cooldown()
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Candidate>, SourceError> {
        let url = self.search_url();
        let api_key = self.cfg.api_key.clone().unwrap_or_default();
        let num = limit.to_string();

        debug!(source = SERPAPI_SOURCE_NAME, query, limit, "searching for ad listings");
        let resp = send_with_retry(SERPAPI_SOURCE_NAME, || {
            self.client.get(&url).query(&[
                ("engine", "youtube"),
                ("search_query", query),
                ("api_key", api_key.as_str()),
                ("num", num.as_str()),
            ])
        })
        .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = body_preview(resp).await;
            return Err(SourceError::UpstreamStatus { status, body });
        }

        let bytes = resp.bytes().await.map_err(SourceError::Http)?;
        let response: SearchResponse = serde_json::from_slice(&bytes)?;

        if let Some(error) = response.error {
            return Err(SourceError::Upstream(error));
        }

        Ok(candidates_from_response(response, &self.cfg.ad_keywords))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ads_results: Vec<SerpListing>,
    #[serde(default)]
    video_results: Vec<SerpListing>,
}

#[derive(Debug, Deserialize)]
struct SerpListing {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    views: Option<serde_json::Value>,
    #[serde(default)]
    channel: Option<SerpChannel>,
}

#[derive(Debug, Deserialize)]
struct SerpChannel {
    #[serde(default)]
    name: Option<String>,
}

fn candidates_from_response(response: SearchResponse, ad_keywords: &[String]) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for listing in response.ads_results {
        if let Some(candidate) = candidate_from_listing(listing, "SerpAPI ad") {
            candidates.push(candidate);
        }
    }

    for listing in response.video_results {
        let ad_like = listing
            .title
            .as_deref()
            .is_some_and(|t| is_ad_like(t, ad_keywords));
        if !ad_like {
            continue;
        }
        if let Some(candidate) = candidate_from_listing(listing, "SerpAPI ad-like content") {
            candidates.push(candidate);
        }
    }

    candidates
}

fn is_ad_like(title: &str, keywords: &[String]) -> bool {
    let lowered = title.to_lowercase();
    keywords.iter().any(|keyword| lowered.contains(keyword.as_str()))
}

fn candidate_from_listing(listing: SerpListing, label: &str) -> Option<Candidate> {
    let link = listing.link.filter(|l| l.contains("youtube.com"))?;
    let title = listing
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())?;

    let mut note_parts = vec![label.to_string()];
    if let Some(views) = listing.views {
        note_parts.push(format!("views: {}", display_count(&views)));
    }
    if let Some(channel) = listing.channel.and_then(|c| c.name) {
        note_parts.push(format!("channel: {channel}"));
    }

    Some(Candidate {
        title: clamp(&title, MAX_TITLE_CHARS),
        url: link,
        note: Some(clamp(&note_parts.join(" | "), MAX_NOTE_CHARS)),
    })
}
