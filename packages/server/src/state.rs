use std::sync::Arc;

use common::storage::BlobStore;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub blob_store: Arc<dyn BlobStore>,
}
