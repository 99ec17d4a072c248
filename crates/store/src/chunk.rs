//! Lazily-pulled chunk reads from a byte source.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read the next chunk of up to `limit` bytes from `source`.
///
/// Returns `None` once the source is exhausted. A chunk shorter than
/// `limit` only occurs at the end of the source.
pub(crate) async fn read_chunk<R>(source: &mut R, limit: usize) -> std::io::Result<Option<Bytes>>
where
    R: AsyncRead + Send + Unpin,
{
    let mut buf = Vec::new();
    (&mut *source).take(limit as u64).read_to_end(&mut buf).await?;
    if buf.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Bytes::from(buf)))
    }
}
