use reqwest::StatusCode;
use thiserror::Error as ThisError;

use super::IsRetryable;

/// Failure to deliver one record to the analysis consumer. The sync scheduler
/// records it on the affected record and continues with the rest of the batch.
#[derive(Debug, ThisError)]
pub enum DeliveryError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Consumer rejected record with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

impl IsRetryable for DeliveryError {
    fn is_retryable(&self) -> bool {
        match self {
            DeliveryError::Http(e) => e.is_timeout() || e.is_connect(),
            DeliveryError::Rejected { status, .. } => status.is_server_error(),
        }
    }
}
