use thiserror::Error as ThisError;

/// Persistence failure. Fatal for the current operation; each store call is a
/// single transaction, so a failed call leaves no partial state behind.
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("record {record_id} not found")]
    NotFound { record_id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store actor error: {0}")]
    Rpc(String),
}
