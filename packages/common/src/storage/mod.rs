mod error;
mod hash;
mod traits;

pub mod memory;
#[cfg(feature = "object-storage")]
pub mod object;
#[cfg(feature = "sea-orm")]
pub mod relational;

pub use error::StorageError;
pub use hash::{ContentHash, ContentHasher};
pub use traits::{BlobStore, BoxReader};
