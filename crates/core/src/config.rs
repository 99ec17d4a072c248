//! Configuration types shared across crates.

use crate::message::ContainerId;
use serde::{Deserialize, Serialize};

/// Remote webhook endpoint configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Webhook id component of the endpoint URL.
    pub webhook_id: String,
    /// Webhook token component of the endpoint URL.
    pub token: String,
    /// API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl RemoteConfig {
    /// Create a config for the default API base.
    pub fn new(webhook_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            webhook_id: webhook_id.into(),
            token: token.into(),
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.webhook_id.is_empty() {
            return Err(crate::Error::Config("webhook_id must not be empty".into()));
        }
        if self.token.is_empty() {
            return Err(crate::Error::Config("token must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Id of the root message holding the persisted index.
    ///
    /// An id that does not resolve to a message (for example `0` on first
    /// use) opens an empty store; closing it then creates a fresh root
    /// message whose id should be recorded for subsequent opens.
    #[serde(default)]
    pub root: ContainerId,
    /// Maximum chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Bound on concurrent chunk transfers (uploads and downloads combined).
    #[serde(default = "default_transfer_concurrency")]
    pub transfers: usize,
}

impl StoreConfig {
    /// Create a config for the given root message id.
    pub fn new(root: ContainerId) -> Self {
        Self {
            root,
            chunk_size: default_chunk_size(),
            transfers: default_transfer_concurrency(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.chunk_size < crate::MIN_CHUNK_SIZE || self.chunk_size > crate::MAX_CHUNK_SIZE {
            return Err(crate::Error::InvalidChunkSize {
                size: self.chunk_size,
                min: crate::MIN_CHUNK_SIZE,
                max: crate::MAX_CHUNK_SIZE,
            });
        }
        if self.transfers == 0 {
            return Err(crate::Error::Config("transfers must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(ContainerId::new(0))
    }
}

fn default_api_base() -> String {
    "https://discord.com/api/webhooks".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_chunk_size() -> usize {
    crate::DEFAULT_CHUNK_SIZE
}

fn default_transfer_concurrency() -> usize {
    crate::DEFAULT_TRANSFER_CONCURRENCY
}
