//! Error types for the job-log store.

use thiserror::Error;

/// Main error type for store operations.
///
/// Not-found on update/remove is deliberately absent: both operations
/// treat a missing identity as success so a delete racing an update never
/// surfaces as a failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Slot file is locked by another process")]
    Locked,

    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
