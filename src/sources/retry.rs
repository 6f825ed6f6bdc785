use backon::{ExponentialBuilder, Retryable};
use reqwest::StatusCode;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{IsRetryable, SourceError};

pub(crate) const UPSTREAM_BODY_PREVIEW_CHARS: usize = 300;

static NETWORK_RETRY_POLICY: LazyLock<ExponentialBuilder> = LazyLock::new(|| {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_millis(300))
        .with_max_times(2)
        .with_jitter()
});

/// Send a provider request, retrying transient failures. The builder closure
/// recreates the request for each attempt.
pub(crate) async fn send_with_retry<F>(
    source: &'static str,
    build: F,
) -> Result<reqwest::Response, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    (|| async {
        let resp = build().send().await.map_err(SourceError::Http)?;
        let status = resp.status();

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            let body = body_preview(resp).await;

            tracing::debug!(
                source,
                %status,
                body = %body,
                "[{source}] Upstream server error (will retry)"
            );

            return Err(SourceError::UpstreamStatus { status, body });
        }

        Ok(resp)
    })
    .retry(*NETWORK_RETRY_POLICY)
    .when(|e: &SourceError| e.is_retryable())
    .await
}

pub(crate) async fn body_preview(resp: reqwest::Response) -> String {
    match resp.bytes().await {
        Ok(bytes) => {
            let raw_body = String::from_utf8_lossy(&bytes);
            format!("{:.len$}", raw_body, len = UPSTREAM_BODY_PREVIEW_CHARS)
        }
        Err(e) => format!("<failed to read body: {e}>"),
    }
}
