use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Consumer sync configuration (see `sync` table in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Base URL of the analysis web service.
    /// TOML: `sync.consumer_url`. Default: `http://localhost:8000`.
    #[serde(default = "default_consumer_url")]
    pub consumer_url: Url,

    /// Optional bearer key sent with every consumer request.
    /// TOML: `sync.api_key`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Minutes between regular sync batches.
    /// TOML: `sync.interval_mins`. Default: `30`.
    #[serde(default = "default_interval_mins")]
    pub interval_mins: u64,

    /// Records per regular batch.
    /// TOML: `sync.batch_size`. Default: `10`.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Hours between catch-up batches.
    /// TOML: `sync.catchup_hours`. Default: `24`.
    #[serde(default = "default_catchup_hours")]
    pub catchup_hours: u64,

    /// Records per catch-up batch.
    /// TOML: `sync.catchup_batch_size`. Default: `100`.
    #[serde(default = "default_catchup_batch_size")]
    pub catchup_batch_size: u32,

    /// Minutes between consumer health probes.
    /// TOML: `sync.health_interval_mins`. Default: `60`.
    #[serde(default = "default_health_interval_mins")]
    pub health_interval_mins: u64,

    /// Delay between individual deliveries, in milliseconds.
    /// TOML: `sync.delivery_delay_ms`. Default: `500`.
    #[serde(default = "default_delivery_delay_ms")]
    pub delivery_delay_ms: u64,

    /// Per-delivery request timeout, in seconds.
    /// TOML: `sync.deliver_timeout_secs`. Default: `30`.
    #[serde(default = "default_deliver_timeout_secs")]
    pub deliver_timeout_secs: u64,

    /// Health probe timeout, in seconds.
    /// TOML: `sync.health_timeout_secs`. Default: `10`.
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_mins * 60)
    }

    pub fn catchup_interval(&self) -> Duration {
        Duration::from_secs(self.catchup_hours * 3600)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_mins * 60)
    }

    pub fn delivery_delay(&self) -> Duration {
        Duration::from_millis(self.delivery_delay_ms)
    }

    pub fn deliver_timeout(&self) -> Duration {
        Duration::from_secs(self.deliver_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            consumer_url: default_consumer_url(),
            api_key: None,
            interval_mins: default_interval_mins(),
            batch_size: default_batch_size(),
            catchup_hours: default_catchup_hours(),
            catchup_batch_size: default_catchup_batch_size(),
            health_interval_mins: default_health_interval_mins(),
            delivery_delay_ms: default_delivery_delay_ms(),
            deliver_timeout_secs: default_deliver_timeout_secs(),
            health_timeout_secs: default_health_timeout_secs(),
        }
    }
}

fn default_consumer_url() -> Url {
    Url::parse("http://localhost:8000").expect("valid default consumer url")
}

fn default_interval_mins() -> u64 {
    30
}

fn default_batch_size() -> u32 {
    10
}

fn default_catchup_hours() -> u64 {
    24
}

fn default_catchup_batch_size() -> u32 {
    100
}

fn default_health_interval_mins() -> u64 {
    60
}

fn default_delivery_delay_ms() -> u64 {
    500
}

fn default_deliver_timeout_secs() -> u64 {
    30
}

fn default_health_timeout_secs() -> u64 {
    10
}
