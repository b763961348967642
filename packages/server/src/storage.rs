use std::sync::Arc;

use anyhow::Context;
use common::storage::memory::MemoryBlobStore;
use common::storage::object::{ObjectBlobStore, ObjectStoreOptions};
use common::storage::relational::RelationalBlobStore;
use common::storage::BlobStore;
use tracing::{info, warn};

use crate::config::{StorageBackend, StorageConfig};
use crate::database::init_db;

/// Build the blob store selected by `storage.backend`.
pub async fn connect_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Relational => {
            let db = init_db(&config.database)
                .await
                .context("Failed to initialize database")?;
            info!(owner = %config.owner, "Using relational blob store");
            Ok(Arc::new(RelationalBlobStore::new(db, config.owner.clone())))
        }
        StorageBackend::Object => {
            let object = &config.object;
            let store = ObjectBlobStore::new(ObjectStoreOptions {
                bucket: object.bucket.clone(),
                region: object.region.clone(),
                endpoint: object.endpoint.clone(),
                access_key: object.access_key.clone(),
                secret_key: object.secret_key.clone(),
                path_style: object.path_style,
                extension: object.extension.clone(),
                content_type: object.content_type.clone(),
            })
            .context("Failed to configure object storage")?;
            info!(
                bucket = %object.bucket,
                region = %object.region,
                endpoint = ?object.endpoint,
                "Using object blob store"
            );
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory blob store; uploads are lost on restart");
            Ok(Arc::new(MemoryBlobStore::new()))
        }
    }
}
