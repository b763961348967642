use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No blob is stored under the requested key.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The backend could not be reached (connection refused, pool exhausted, DNS...).
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Reading from the backend or from a source stream failed.
    #[error("storage read failed: {0}")]
    ReadFailure(String),

    /// Persisting a blob failed for a reason other than connectivity.
    #[error("storage write failed: {0}")]
    WriteFailure(String),

    /// The provided content hash is invalid.
    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    /// The blob exceeds the configured size limit.
    #[error("blob exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },

    /// The backend was configured with unusable settings.
    #[error("invalid storage configuration: {0}")]
    Configuration(String),
}
