//! The chunked path store.

use crate::chunk::read_chunk;
use crate::error::{StoreError, StoreResult};
use crate::index::PathIndex;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use loft_core::config::StoreConfig;
use loft_core::{ContainerId, FilePart, MessagePayload};
use loft_remote::Webhook;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StoreResult<Bytes>> + Send>>;

/// Filename of the index attachment on the root message.
const INDEX_FILENAME: &str = "index.json";

/// Path-addressed chunked storage over remote message attachments.
///
/// Payloads are split into chunks of at most the configured chunk size;
/// each chunk is uploaded as the single attachment of its own message,
/// labeled with the owning path. The path to chunk-sequence index lives in
/// memory and round-trips through the root message only at [`open`] and
/// [`close`].
///
/// One permit pool bounds concurrent chunk transfers across every put and
/// get on the instance.
///
/// [`open`]: PathStore::open
/// [`close`]: PathStore::close
pub struct PathStore {
    remote: Arc<dyn Webhook>,
    index: PathIndex,
    permits: Arc<Semaphore>,
    root: ContainerId,
    chunk_size: usize,
    capacity: usize,
}

impl PathStore {
    /// Open a store, restoring the persisted index from the root message.
    ///
    /// A missing root message, absent attachment, or malformed index all
    /// recover to an empty index; a fresh store is a valid initial state.
    pub async fn open(remote: Arc<dyn Webhook>, config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let index = Self::restore_index(remote.as_ref(), config.root).await;
        Ok(Self {
            remote,
            index,
            permits: Arc::new(Semaphore::new(config.transfers)),
            root: config.root,
            chunk_size: config.chunk_size,
            capacity: config.transfers,
        })
    }

    async fn restore_index(remote: &dyn Webhook, root: ContainerId) -> PathIndex {
        let loaded = async {
            let message = remote.message(root).await.ok()?;
            let attachment = message.attachments.first()?;
            let bytes = remote.download(&attachment.url).await.ok()?;
            PathIndex::from_json(&bytes).ok()
        }
        .await;

        match loaded {
            Some(index) => {
                debug!(root = %root, paths = index.len(), "restored persisted index");
                index
            }
            None => {
                debug!(root = %root, "no usable persisted index, starting empty");
                PathIndex::new()
            }
        }
    }

    /// The root message id this store was opened against.
    pub fn root(&self) -> ContainerId {
        self.root
    }

    /// Snapshot of all registered paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.index.paths()
    }

    /// Number of registered paths.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the store has no registered paths.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Flush the in-memory index to the root message.
    ///
    /// This is the only point the index round-trips through the remote; a
    /// crash between a `put` and `close` loses that put's index entry (the
    /// chunks stay uploaded but unreferenced). Returns the id of the
    /// message now holding the index, which differs from the configured
    /// root when that message had to be created.
    #[instrument(skip(self))]
    pub async fn close(&self) -> StoreResult<ContainerId> {
        let part = FilePart::new(INDEX_FILENAME, Bytes::from(self.index.to_json()?));
        let id = match self.remote.message(self.root).await {
            Ok(_) => {
                self.remote
                    .edit(self.root, Some(MessagePayload::clear()), vec![part])
                    .await?
                    .id
            }
            Err(_) => {
                let created = self.remote.execute(None, vec![part]).await?;
                warn!(
                    id = %created.id,
                    "root message was missing; created a fresh one, record its id"
                );
                created.id
            }
        };
        info!(paths = self.index.len(), root = %id, "index persisted");
        Ok(id)
    }

    /// Store `source`'s bytes under `path`, superseding any previous
    /// payload.
    ///
    /// Chunks are scheduled in source order and the resulting sequence
    /// preserves that order regardless of upload completion order. The
    /// superseded sequence's chunks are deleted concurrently with the new
    /// uploads; both finish before this call returns. An empty source
    /// registers the path with an empty sequence.
    ///
    /// On failure the index keeps no entry for `path`; chunks uploaded
    /// before the failure are left unreferenced remotely.
    #[instrument(skip(self, source))]
    pub async fn put<R>(&self, path: &str, mut source: R) -> StoreResult<()>
    where
        R: AsyncRead + Send + Unpin,
    {
        let old = self.index.remove(path);
        let mut cleanups: Vec<JoinHandle<StoreResult<()>>> = Vec::new();
        if let Some(old) = old {
            debug!(path, chunks = old.len(), "superseding existing sequence");
            for id in old {
                let remote = Arc::clone(&self.remote);
                cleanups.push(tokio::spawn(async move {
                    remote.delete(id).await?;
                    Ok(())
                }));
            }
        }

        let uploaded = self.upload_chunks(path, &mut source).await;

        let mut cleanup_failure = None;
        for handle in cleanups {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    cleanup_failure.get_or_insert(e);
                }
                Err(e) => {
                    cleanup_failure.get_or_insert(StoreError::Join(e));
                }
            }
        }

        let ids = uploaded?;
        if let Some(failure) = cleanup_failure {
            return Err(failure);
        }
        debug!(path, chunks = ids.len(), "sequence registered");
        self.index.insert(path, ids);
        Ok(())
    }

    /// Read chunks from `source` and upload each as its own message,
    /// returning ids in schedule order.
    async fn upload_chunks<R>(&self, path: &str, source: &mut R) -> StoreResult<Vec<ContainerId>>
    where
        R: AsyncRead + Send + Unpin,
    {
        let mut pending: Vec<JoinHandle<StoreResult<ContainerId>>> = Vec::new();

        // The permit acquired before each spawn bounds in-flight transfers
        // and doubles as backpressure on reading ahead of the uploads.
        let read_result = loop {
            let chunk = match read_chunk(source, self.chunk_size).await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break Ok(()),
                Err(e) => break Err(StoreError::Io(e)),
            };
            let permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .expect("transfer semaphore closed");
            let remote = Arc::clone(&self.remote);
            let payload = MessagePayload::with_content(path);
            let filename = pending.len().to_string();
            pending.push(tokio::spawn(async move {
                let part = FilePart::new(filename, chunk);
                let message = remote.execute(Some(payload), vec![part]).await?;
                drop(permit);
                Ok(message.id)
            }));
        };

        // Ids are collected in schedule order regardless of completion
        // order. Every spawned upload is awaited even after a failure so
        // nothing outlives this call.
        let mut ids = Vec::with_capacity(pending.len());
        let mut failure = read_result.err();
        for handle in pending {
            match handle.await {
                Ok(Ok(id)) => ids.push(id),
                Ok(Err(e)) => {
                    failure.get_or_insert(e);
                }
                Err(e) => {
                    failure.get_or_insert(StoreError::Join(e));
                }
            }
        }

        match failure {
            None => Ok(ids),
            Some(e) => Err(e),
        }
    }

    /// Stream the payload stored under `path`, or `None` if the path is
    /// not registered.
    ///
    /// Up to the configured transfer capacity of chunk downloads run
    /// concurrently, but bytes are emitted strictly in sequence order: the
    /// stream stalls on chunk `i` until it completes, even when later
    /// chunks finished earlier. Consumption is incremental; the first
    /// bytes arrive before the last chunks download.
    #[instrument(skip(self))]
    pub async fn get(&self, path: &str) -> Option<ByteStream> {
        let ids = self.index.sequence(path)?;
        debug!(path, chunks = ids.len(), "streaming sequence");

        let remote = Arc::clone(&self.remote);
        let permits = Arc::clone(&self.permits);
        let stream = stream::iter(ids)
            .map(move |id| {
                let remote = Arc::clone(&remote);
                let permits = Arc::clone(&permits);
                async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .expect("transfer semaphore closed");
                    let message = remote.message(id).await?;
                    let attachment = message
                        .attachments
                        .first()
                        .ok_or(StoreError::MissingAttachment(id))?;
                    Ok(remote.download(&attachment.url).await?)
                }
            })
            .buffered(self.capacity);

        Some(Box::pin(stream))
    }

    /// Fetch the full payload stored under `path` into memory.
    pub async fn get_all(&self, path: &str) -> StoreResult<Option<Bytes>> {
        let Some(mut stream) = self.get(path).await else {
            return Ok(None);
        };
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(Some(buf.freeze()))
    }

    /// Remove `path` and delete each of its chunks.
    ///
    /// Unlike `put`'s superseded-chunk cleanup, the deletions are awaited:
    /// there is no replacement data to protect, so the call only returns
    /// once every chunk delete completed. Returns whether the path was
    /// registered.
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> StoreResult<bool> {
        let Some(ids) = self.index.remove(path) else {
            return Ok(false);
        };
        debug!(path, chunks = ids.len(), "deleting sequence");

        let mut deletions = Vec::with_capacity(ids.len());
        for id in ids {
            let remote = Arc::clone(&self.remote);
            deletions.push(tokio::spawn(async move {
                remote.delete(id).await.map_err(StoreError::from)
            }));
        }
        for handle in deletions {
            handle.await??;
        }
        Ok(true)
    }
}
