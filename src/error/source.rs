use reqwest::StatusCode;
use thiserror::Error as ThisError;

use super::IsRetryable;

/// Failure of a single source fetch attempt. Transient by design: the
/// collector logs it and moves on without touching fetch history.
#[derive(Debug, ThisError)]
pub enum SourceError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream error with status {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("Upstream reported error: {0}")]
    Upstream(String),

    #[error("Bad upstream payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl IsRetryable for SourceError {
    fn is_retryable(&self) -> bool {
        match self {
            SourceError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            SourceError::UpstreamStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            SourceError::Upstream(_) | SourceError::Decode(_) | SourceError::Url(_) => false,
        }
    }
}
