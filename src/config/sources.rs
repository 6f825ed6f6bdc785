use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Source client settings (see `sources` table in config.toml).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Bulk scraping provider. TOML: `sources.apify`.
    #[serde(default)]
    pub apify: ApifyConfig,

    /// Search-engine-backed provider. TOML: `sources.serp`.
    #[serde(default)]
    pub serp: SerpApiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApifyConfig {
    /// API token. The source is enabled iff a token is present.
    /// TOML: `sources.apify.token` (or env `ADSIFT_SOURCES__APIFY__TOKEN`).
    #[serde(default)]
    pub token: Option<String>,

    /// TOML: `sources.apify.base_url`. Default: `https://api.apify.com`.
    #[serde(default = "default_apify_base_url")]
    pub base_url: Url,

    /// Actor run for the dataset fetch.
    /// TOML: `sources.apify.actor`. Default: `xtech~youtube-ads-scraper`.
    #[serde(default = "default_apify_actor")]
    pub actor: String,

    /// Re-fetch cooldown per query, in hours.
    /// TOML: `sources.apify.cooldown_hours`. Default: `24`.
    #[serde(default = "default_apify_cooldown_hours")]
    pub cooldown_hours: u64,

    /// Request timeout in seconds. Actor runs are slow; the default is generous.
    /// TOML: `sources.apify.timeout_secs`. Default: `300`.
    #[serde(default = "default_apify_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApifyConfig {
    pub fn enabled(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_hours * 3600)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApifyConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_apify_base_url(),
            actor: default_apify_actor(),
            cooldown_hours: default_apify_cooldown_hours(),
            timeout_secs: default_apify_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerpApiConfig {
    /// API key. The source is enabled iff a key is present.
    /// TOML: `sources.serp.api_key` (or env `ADSIFT_SOURCES__SERP__API_KEY`).
    #[serde(default)]
    pub api_key: Option<String>,

    /// TOML: `sources.serp.base_url`. Default: `https://serpapi.com`.
    #[serde(default = "default_serp_base_url")]
    pub base_url: Url,

    /// Re-fetch cooldown per query, in hours.
    /// TOML: `sources.serp.cooldown_hours`. Default: `6`.
    #[serde(default = "default_serp_cooldown_hours")]
    pub cooldown_hours: u64,

    /// Request timeout in seconds.
    /// TOML: `sources.serp.timeout_secs`. Default: `60`.
    #[serde(default = "default_serp_timeout_secs")]
    pub timeout_secs: u64,

    /// Keywords that qualify an organic search result as ad-like content.
    /// TOML: `sources.serp.ad_keywords`.
    #[serde(default = "default_ad_keywords")]
    pub ad_keywords: Vec<String>,
}

impl SerpApiConfig {
    pub fn enabled(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_hours * 3600)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SerpApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_serp_base_url(),
            cooldown_hours: default_serp_cooldown_hours(),
            timeout_secs: default_serp_timeout_secs(),
            ad_keywords: default_ad_keywords(),
        }
    }
}

fn default_apify_base_url() -> Url {
    Url::parse("https://api.apify.com").expect("valid default Apify base url")
}

fn default_apify_actor() -> String {
    "xtech~youtube-ads-scraper".to_string()
}

fn default_apify_cooldown_hours() -> u64 {
    24
}

fn default_apify_timeout_secs() -> u64 {
    300
}

fn default_serp_base_url() -> Url {
    Url::parse("https://serpapi.com").expect("valid default SerpAPI base url")
}

fn default_serp_cooldown_hours() -> u64 {
    6
}

fn default_serp_timeout_secs() -> u64 {
    60
}

fn default_ad_keywords() -> Vec<String> {
    [
        "ad",
        "advertisement",
        "commercial",
        "sponsored",
        "promo",
        "review",
        "unboxing",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}
