mod basic;
mod collect;
mod sources;
mod sync;

pub use basic::BasicConfig;
pub use collect::CollectConfig;
pub use sources::{ApifyConfig, SerpApiConfig, SourcesConfig};
pub use sync::SyncConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration managed by Figment. Components never read this
/// globally; each receives its resolved section at construction time.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core settings (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Collection pass settings (see `collect` table in config.toml).
    #[serde(default)]
    pub collect: CollectConfig,

    /// Source client settings (see `sources` table in config.toml).
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Consumer sync settings (see `sync` table in config.toml).
    #[serde(default)]
    pub sync: SyncConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults, a config TOML file, and
    /// `ADSIFT_`-prefixed environment variables (`__` as section separator).
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        figment.merge(Env::prefixed("ADSIFT_").split("__"))
    }

    /// Loads configuration by merging defaults, `config.toml` if present, and
    /// environment overrides.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }
}
