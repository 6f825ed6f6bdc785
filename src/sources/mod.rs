//! Source clients: each provider turns a search query into ad-video
//! candidates. The collector is polymorphic over [`SourceClient`] and runs
//! with zero, one, or many sources configured.

mod apify;
pub(crate) mod retry;
mod serp;

pub use apify::{APIFY_SOURCE_NAME, ApifySource};
pub use serp::{SERPAPI_SOURCE_NAME, SerpApiSource};

use async_trait::async_trait;
use std::time::Duration;

use crate::db::Candidate;
use crate::error::SourceError;

pub const MAX_TITLE_CHARS: usize = 150;
pub const MAX_NOTE_CHARS: usize = 200;

#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Stable name recorded on every record and fetch-history row.
    fn name(&self) -> &'static str;

    /// Minimum time before the same query may be re-fetched from this source.
    fn cooldown(&self) -> Duration;

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Candidate>, SourceError>;
}

/// Truncate on a char boundary; provider titles and notes are unbounded.
pub(crate) fn clamp(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Render a loosely-typed JSON count (providers send both strings and numbers).
pub(crate) fn display_count(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clamp_respects_char_boundaries() {
        assert_eq!(clamp("광고 영상 모음", 5), "광고 영상");
        assert_eq!(clamp("short", 150), "short");
    }

    #[test]
    fn display_count_unwraps_strings_and_numbers() {
        assert_eq!(display_count(&json!("1,234")), "1,234");
        assert_eq!(display_count(&json!(1234)), "1234");
    }
}
