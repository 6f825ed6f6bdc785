use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Collection pass configuration (see `collect` table in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectConfig {
    /// Search queries driven, in order, on each collection pass.
    /// TOML: `collect.queries`.
    #[serde(default = "default_queries")]
    pub queries: Vec<String>,

    /// Maximum candidates requested per (query, source) invocation.
    /// TOML: `collect.per_query_limit`. Default: `50`.
    #[serde(default = "default_per_query_limit")]
    pub per_query_limit: u32,

    /// Delay applied after each source invocation, in milliseconds.
    /// TOML: `collect.source_delay_ms`. Default: `1000`.
    #[serde(default = "default_source_delay_ms")]
    pub source_delay_ms: u64,

    /// Minutes between collection passes.
    /// TOML: `collect.interval_mins`. Default: `30`.
    #[serde(default = "default_interval_mins")]
    pub interval_mins: u64,
}

impl CollectConfig {
    pub fn source_delay(&self) -> Duration {
        Duration::from_millis(self.source_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_mins * 60)
    }
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            queries: default_queries(),
            per_query_limit: default_per_query_limit(),
            source_delay_ms: default_source_delay_ms(),
            interval_mins: default_interval_mins(),
        }
    }
}

fn default_queries() -> Vec<String> {
    [
        "advertisement commercial",
        "product promotion",
        "brand commercial",
        "sponsored content",
        "new product launch",
        "company ad",
        "marketing video",
        "product review",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_per_query_limit() -> u32 {
    50
}

fn default_source_delay_ms() -> u64 {
    1000
}

fn default_interval_mins() -> u64 {
    30
}
