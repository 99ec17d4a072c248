use async_trait::async_trait;
use bytes::Bytes;
use loft_core::{Attachment, ContainerId, FilePart, Message, MessagePayload};
use loft_remote::{RemoteError, RemoteResult, Webhook};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
struct StoredMessage {
    content: String,
    attachments: Vec<Attachment>,
}

/// In-memory webhook backend for store tests.
///
/// Tracks the high-water mark of concurrent transfers (message creation
/// and attachment downloads), records every delete call, and can inject a
/// terminal failure into the nth upload.
pub struct MockWebhook {
    messages: Mutex<HashMap<u64, StoredMessage>>,
    blobs: Mutex<HashMap<String, Bytes>>,
    deletions: Mutex<Vec<u64>>,
    next_id: AtomicU64,
    execute_calls: AtomicUsize,
    fail_execute_at: Mutex<Option<usize>>,
    active_transfers: AtomicUsize,
    max_transfers: AtomicUsize,
    transfer_delay: Duration,
    staggered_downloads: bool,
}

#[allow(dead_code)]
impl MockWebhook {
    pub fn new() -> Arc<Self> {
        Self::build(Duration::ZERO, false)
    }

    /// Every transfer holds its slot for `delay`, making overlap
    /// observable.
    pub fn with_transfer_delay(delay: Duration) -> Arc<Self> {
        Self::build(delay, false)
    }

    /// Later chunks finish downloading before earlier ones, exercising the
    /// order-preserving reassembly.
    pub fn with_staggered_downloads() -> Arc<Self> {
        Self::build(Duration::from_millis(1), true)
    }

    fn build(transfer_delay: Duration, staggered_downloads: bool) -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(HashMap::new()),
            blobs: Mutex::new(HashMap::new()),
            deletions: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            execute_calls: AtomicUsize::new(0),
            fail_execute_at: Mutex::new(None),
            active_transfers: AtomicUsize::new(0),
            max_transfers: AtomicUsize::new(0),
            transfer_delay,
            staggered_downloads,
        })
    }

    /// Make the nth `execute` call (0-based) fail terminally.
    pub fn fail_execute_at(&self, n: usize) {
        *self.fail_execute_at.lock().unwrap() = Some(n);
    }

    /// Ids passed to `delete`, in call order, duplicates included.
    pub fn deletions(&self) -> Vec<u64> {
        self.deletions.lock().unwrap().clone()
    }

    /// Total `execute` calls so far.
    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    /// Highest number of transfers ever in flight simultaneously.
    pub fn max_in_flight(&self) -> usize {
        self.max_transfers.load(Ordering::SeqCst)
    }

    /// Number of live messages.
    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    /// The content label of a live message.
    pub fn content_of(&self, id: ContainerId) -> Option<String> {
        self.messages
            .lock()
            .unwrap()
            .get(&id.as_u64())
            .map(|m| m.content.clone())
    }

    /// The stored bytes of a message's single attachment.
    pub fn chunk_bytes(&self, id: ContainerId) -> Option<Bytes> {
        let url = {
            let messages = self.messages.lock().unwrap();
            messages.get(&id.as_u64())?.attachments.first()?.url.clone()
        };
        self.blobs.lock().unwrap().get(&url).cloned()
    }

    /// Filenames attached to a live message.
    pub fn message_attachments(&self, id: ContainerId) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .get(&id.as_u64())
            .map(|m| m.attachments.iter().map(|a| a.filename.clone()).collect())
            .unwrap_or_default()
    }

    /// Seed a message whose single attachment holds `bytes`, returning its
    /// id. Used to pre-populate a root container.
    pub fn seed_root(&self, bytes: &[u8]) -> ContainerId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let attachments = self.store_parts(
            id,
            vec![FilePart::new("index.json", Bytes::copy_from_slice(bytes))],
        );
        self.messages.lock().unwrap().insert(
            id,
            StoredMessage {
                content: String::new(),
                attachments,
            },
        );
        ContainerId::new(id)
    }

    /// Seed a message with no attachments, returning its id.
    pub fn seed_bare_root(&self) -> ContainerId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().unwrap().insert(
            id,
            StoredMessage {
                content: String::new(),
                attachments: Vec::new(),
            },
        );
        ContainerId::new(id)
    }

    fn begin_transfer(&self) {
        let now = self.active_transfers.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_transfers.fetch_max(now, Ordering::SeqCst);
    }

    fn end_transfer(&self) {
        self.active_transfers.fetch_sub(1, Ordering::SeqCst);
    }

    fn store_parts(&self, id: u64, parts: Vec<FilePart>) -> Vec<Attachment> {
        let mut attachments = Vec::with_capacity(parts.len());
        let mut blobs = self.blobs.lock().unwrap();
        for (i, part) in parts.into_iter().enumerate() {
            let url = format!("mock://{id}/{}", part.filename);
            attachments.push(Attachment {
                id: ContainerId::new(id * 100 + i as u64),
                filename: part.filename,
                size: part.bytes.len() as u64,
                url: url.clone(),
            });
            blobs.insert(url, part.bytes);
        }
        attachments
    }

    fn not_found(what: impl Into<String>) -> RemoteError {
        RemoteError::Status {
            status: StatusCode::NOT_FOUND,
            body: what.into(),
        }
    }
}

#[async_trait]
impl Webhook for MockWebhook {
    async fn execute(
        &self,
        payload: Option<MessagePayload>,
        parts: Vec<FilePart>,
    ) -> RemoteResult<Message> {
        let call = self.execute_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_execute_at.lock().unwrap() == Some(call) {
            return Err(RemoteError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "injected failure".to_string(),
            });
        }

        self.begin_transfer();
        tokio::time::sleep(self.transfer_delay).await;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let content = payload
            .and_then(|p| p.content)
            .unwrap_or_default();
        let attachments = self.store_parts(id, parts);
        self.messages.lock().unwrap().insert(
            id,
            StoredMessage {
                content: content.clone(),
                attachments: attachments.clone(),
            },
        );

        self.end_transfer();
        Ok(Message {
            id: ContainerId::new(id),
            content,
            attachments,
        })
    }

    async fn message(&self, id: ContainerId) -> RemoteResult<Message> {
        let messages = self.messages.lock().unwrap();
        let stored = messages
            .get(&id.as_u64())
            .ok_or_else(|| Self::not_found(format!("no message {id}")))?;
        Ok(Message {
            id,
            content: stored.content.clone(),
            attachments: stored.attachments.clone(),
        })
    }

    async fn edit(
        &self,
        id: ContainerId,
        payload: Option<MessagePayload>,
        parts: Vec<FilePart>,
    ) -> RemoteResult<Message> {
        if !self.messages.lock().unwrap().contains_key(&id.as_u64()) {
            return Err(Self::not_found(format!("no message {id}")));
        }

        let new_attachments = self.store_parts(id.as_u64(), parts);
        let mut messages = self.messages.lock().unwrap();
        let stored = messages
            .get_mut(&id.as_u64())
            .ok_or_else(|| Self::not_found(format!("no message {id}")))?;

        if let Some(payload) = payload {
            if let Some(content) = payload.content {
                stored.content = content;
            }
            if let Some(declared) = payload.attachments {
                // An explicit list replaces what the message carried; the
                // store only ever sends an empty list here.
                stored
                    .attachments
                    .retain(|a| declared.iter().any(|d| d.filename == a.filename));
            }
        }
        stored.attachments.extend(new_attachments);

        Ok(Message {
            id,
            content: stored.content.clone(),
            attachments: stored.attachments.clone(),
        })
    }

    async fn delete(&self, id: ContainerId) -> RemoteResult<()> {
        self.deletions.lock().unwrap().push(id.as_u64());
        self.messages.lock().unwrap().remove(&id.as_u64());
        Ok(())
    }

    async fn download(&self, url: &str) -> RemoteResult<Bytes> {
        self.begin_transfer();
        let delay = if self.staggered_downloads {
            // Higher chunk indexes complete sooner.
            let index: u64 = url
                .rsplit('/')
                .next()
                .and_then(|name| name.parse().ok())
                .unwrap_or(0);
            Duration::from_millis(20u64.saturating_sub(index * 2))
        } else {
            self.transfer_delay
        };
        tokio::time::sleep(delay).await;

        let blob = self.blobs.lock().unwrap().get(url).cloned();
        self.end_transfer();
        blob.ok_or_else(|| Self::not_found(format!("no blob at {url}")))
    }
}
