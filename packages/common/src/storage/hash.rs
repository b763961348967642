use std::fmt;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

const HASH_LEN: usize = 16;
const HEX_LEN: usize = HASH_LEN * 2;
const READ_BUF_SIZE: usize = 64 * 1024;

/// A validated 128-bit (MD5) content hash.
///
/// This is the content key of the service: blobs are stored and looked up by
/// the lowercase hex form of the digest of their own bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// Compute the hash of the given data.
    pub fn compute(data: &[u8]) -> Self {
        Self(Md5::digest(data).into())
    }

    /// Hash an async reader until EOF, returning the hash and the number of bytes read.
    ///
    /// The reader is consumed exactly once and never rewound. Callers that need the
    /// bytes afterwards must buffer them (see [`BlobStore::put_stream`]).
    ///
    /// [`BlobStore::put_stream`]: super::BlobStore::put_stream
    pub async fn compute_reader<R>(reader: &mut R) -> Result<(Self, u64), StorageError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut hasher = ContentHasher::new();
        let mut buf = vec![0u8; READ_BUF_SIZE];

        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| StorageError::ReadFailure(e.to_string()))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        let len = hasher.len();
        Ok((hasher.finalize(), len))
    }

    /// Parse a hex-encoded content hash string.
    ///
    /// Only the canonical lowercase form is accepted so that every blob has exactly
    /// one URL.
    pub fn from_hex(s: &str) -> Result<Self, StorageError> {
        if s.len() != HEX_LEN {
            return Err(StorageError::InvalidHash(format!(
                "expected {HEX_LEN} hex characters, got {}",
                s.len()
            )));
        }

        if s.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(StorageError::InvalidHash(
                "hex digits must be lowercase".into(),
            ));
        }

        let bytes =
            hex::decode(s).map_err(|e| StorageError::InvalidHash(format!("invalid hex: {e}")))?;

        let arr: [u8; HASH_LEN] = bytes
            .try_into()
            .map_err(|_| StorageError::InvalidHash("decoded to wrong length".into()))?;

        Ok(Self(arr))
    }

    /// Return the hash as a 32-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Incremental hasher for payloads that arrive in chunks.
#[derive(Clone, Default)]
pub struct ContentHasher {
    inner: Md5,
    len: u64,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
        self.len += chunk.len() as u64;
    }

    /// Bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finalize(self) -> ContentHash {
        ContentHash(self.inner.finalize().into())
    }
}
