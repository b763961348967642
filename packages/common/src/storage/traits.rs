use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::hash::ContentHash;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Content-addressed blob storage.
///
/// Writes are skip-if-exists: once a key is stored, later `put`s of the same key
/// succeed without touching the stored bytes. Since the key is the digest of the
/// payload, concurrent writers of one key always carry identical bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `hash`, which must be `ContentHash::compute(data)`.
    async fn put(&self, hash: &ContentHash, data: &[u8]) -> Result<(), StorageError>;

    /// Retrieve all bytes for a blob by its content hash.
    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// Buffer a reader, hash it and store it. Returns the content hash.
    async fn put_stream(&self, mut reader: BoxReader) -> Result<ContentHash, StorageError> {
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .map_err(|e| StorageError::ReadFailure(e.to_string()))?;

        let hash = ContentHash::compute(&buf);
        self.put(&hash, &buf).await?;
        Ok(hash)
    }
}
