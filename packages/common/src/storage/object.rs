use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use tracing::debug;

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::BlobStore;

/// Connection settings for [`ObjectBlobStore`].
#[derive(Debug, Clone)]
pub struct ObjectStoreOptions {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible servers. `None` means AWS.
    pub endpoint: Option<String>,
    /// When both keys are `None` the standard credential chain is used
    /// (environment, shared profile, instance metadata).
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub path_style: bool,
    /// Object name suffix, without the dot.
    pub extension: String,
    pub content_type: String,
}

/// Blob store backed by an S3-compatible bucket.
///
/// Each blob is the object `<hash>.<extension>`. Owner and timestamps are not
/// recorded.
pub struct ObjectBlobStore {
    bucket: Box<Bucket>,
    extension: String,
    content_type: String,
}

impl ObjectBlobStore {
    pub fn new(options: ObjectStoreOptions) -> Result<Self, StorageError> {
        if options.bucket.trim().is_empty() {
            return Err(StorageError::Configuration(
                "object storage bucket name is empty".into(),
            ));
        }

        let region = match options.endpoint {
            Some(endpoint) => Region::Custom {
                region: options.region,
                endpoint,
            },
            None => options
                .region
                .parse()
                .map_err(|e| StorageError::Configuration(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            options.access_key.as_deref(),
            options.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Configuration(format!("object storage credentials: {e}")))?;

        let mut bucket = Bucket::new(&options.bucket, region, credentials)
            .map_err(|e| StorageError::Configuration(e.to_string()))?;
        if options.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            extension: options.extension,
            content_type: options.content_type,
        })
    }

    /// Object name for a hash, e.g. `d41d8cd98f00b204e9800998ecf8427e.png`.
    pub fn object_path(&self, hash: &ContentHash) -> String {
        object_path(hash, &self.extension)
    }
}

fn object_path(hash: &ContentHash, extension: &str) -> String {
    if extension.is_empty() {
        hash.to_hex()
    } else {
        format!("{}.{extension}", hash.to_hex())
    }
}

/// Which side of the store a bucket request serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// Map a non-success HTTP status from the bucket to a storage error.
///
/// A 404 only means a missing blob on reads. On writes it means the bucket
/// itself is gone.
fn status_error(status: u16, hash: &ContentHash, access: Access) -> StorageError {
    let detail = format!("object storage returned {status}");
    match (status, access) {
        (404, Access::Read) => StorageError::NotFound(hash.to_hex()),
        (500..=599, _) => StorageError::BackendUnavailable(detail),
        (_, Access::Read) => StorageError::ReadFailure(detail),
        (_, Access::Write) => StorageError::WriteFailure(detail),
    }
}

/// Map a client error. HTTP failures carry a status; anything else is transport.
fn client_error(err: S3Error, hash: &ContentHash, access: Access) -> StorageError {
    match err {
        S3Error::HttpFailWithBody(status, _) => status_error(status, hash, access),
        other => StorageError::BackendUnavailable(other.to_string()),
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn put(&self, hash: &ContentHash, data: &[u8]) -> Result<(), StorageError> {
        if self.exists(hash).await? {
            debug!(hash = %hash, "Object already stored, skipping write");
            return Ok(());
        }

        let path = self.object_path(hash);
        let response = self
            .bucket
            .put_object_with_content_type(&path, data, &self.content_type)
            .await
            .map_err(|e| client_error(e, hash, Access::Write))?;

        let status = response.status_code();
        if !is_success(status) {
            return Err(status_error(status, hash, Access::Write));
        }

        Ok(())
    }

    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(hash);
        let response = self
            .bucket
            .get_object(&path)
            .await
            .map_err(|e| client_error(e, hash, Access::Read))?;

        let status = response.status_code();
        if !is_success(status) {
            return Err(status_error(status, hash, Access::Read));
        }

        Ok(response.bytes().to_vec())
    }

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        let path = self.object_path(hash);
        match self.bucket.head_object(&path).await {
            Ok((_, status)) if is_success(status) => Ok(true),
            Ok((_, 404)) => Ok(false),
            Ok((_, status)) => Err(status_error(status, hash, Access::Read)),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(client_error(e, hash, Access::Read)),
        }
    }
}
