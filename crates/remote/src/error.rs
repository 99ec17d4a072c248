//! Remote failure taxonomy.
//!
//! Rate limits and transient timeouts are absorbed by the transport and
//! never reach callers; everything else propagates verbatim.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Errors from the remote webhook API.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("rate limited by remote")]
    RateLimited {
        /// Wait suggested by the remote, if its response carried one.
        retry_after: Option<Duration>,
    },

    #[error("request timed out")]
    Timeout,

    #[error("remote returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("http transport error: {0}")]
    Http(reqwest::Error),

    #[error("malformed request payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] loft_core::Error),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Result type for remote operations.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
