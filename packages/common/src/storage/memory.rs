use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::BlobStore;

/// Process-local blob store.
///
/// Nothing survives a restart. Used for local runs and as the store behind the
/// HTTP tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<ContentHash, Bytes>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs stored.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, hash: &ContentHash, data: &[u8]) -> Result<(), StorageError> {
        self.blobs
            .entry(*hash)
            .or_insert_with(|| Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .get(hash)
            .map(|blob| blob.to_vec())
            .ok_or_else(|| StorageError::NotFound(hash.to_hex()))
    }

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        Ok(self.blobs.contains_key(hash))
    }
}
