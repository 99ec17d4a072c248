//! The webhook capability consumed by the store layer.

use crate::error::RemoteResult;
use async_trait::async_trait;
use bytes::Bytes;
use loft_core::{ContainerId, FilePart, Message, MessagePayload};

/// Remote message hosting over a webhook.
///
/// Implementations are expected to absorb rate limits and transient
/// timeouts internally (see [`crate::Transport`]); callers only ever see
/// terminal failures.
#[async_trait]
pub trait Webhook: Send + Sync + 'static {
    /// Create a new message, optionally carrying file parts.
    async fn execute(
        &self,
        payload: Option<MessagePayload>,
        parts: Vec<FilePart>,
    ) -> RemoteResult<Message>;

    /// Fetch a message by id, including its attachment URLs.
    async fn message(&self, id: ContainerId) -> RemoteResult<Message>;

    /// Edit a message, replacing payload fields and appending file parts.
    async fn edit(
        &self,
        id: ContainerId,
        payload: Option<MessagePayload>,
        parts: Vec<FilePart>,
    ) -> RemoteResult<Message>;

    /// Delete a message. Deleting an already-deleted message succeeds.
    async fn delete(&self, id: ContainerId) -> RemoteResult<()>;

    /// Download an attachment URL's raw bytes.
    async fn download(&self, url: &str) -> RemoteResult<Bytes>;
}
