//! Store error types.

use thiserror::Error;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Remote(#[from] loft_remote::RemoteError),

    #[error(transparent)]
    Config(#[from] loft_core::Error),

    #[error("index serialization error: {0}")]
    Index(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("message {0} has no attachment")]
    MissingAttachment(loft_core::ContainerId),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
