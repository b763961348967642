use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect, Set,
};
use tracing::debug;

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::BlobStore;
use crate::entity::picture;

/// Blob store backed by the `pictures` table.
///
/// `DatabaseConnection` is a pool: every query checks a connection out for its own
/// duration and the pool takes it back on every exit path.
#[derive(Clone)]
pub struct RelationalBlobStore {
    db: DatabaseConnection,
    owner: String,
}

impl RelationalBlobStore {
    /// `owner` is recorded as `user_id` on every row this store inserts.
    pub fn new(db: DatabaseConnection, owner: impl Into<String>) -> Self {
        Self {
            db,
            owner: owner.into(),
        }
    }

    /// Fetch the full row for a hash.
    pub async fn find_record(
        &self,
        hash: &ContentHash,
    ) -> Result<Option<picture::Model>, StorageError> {
        picture::Entity::find()
            .filter(picture::Column::Hash.eq(hash.to_hex()))
            .one(&self.db)
            .await
            .map_err(|e| classify(e, StorageError::ReadFailure))
    }
}

/// Connection-level failures become `BackendUnavailable`; everything else goes to `fallback`.
fn classify(err: DbErr, fallback: fn(String) -> StorageError) -> StorageError {
    match err {
        DbErr::ConnectionAcquire(e) => StorageError::BackendUnavailable(e.to_string()),
        DbErr::Conn(e) => StorageError::BackendUnavailable(e.to_string()),
        other => fallback(other.to_string()),
    }
}

#[async_trait]
impl BlobStore for RelationalBlobStore {
    async fn put(&self, hash: &ContentHash, data: &[u8]) -> Result<(), StorageError> {
        let now = Utc::now();
        let row = picture::ActiveModel {
            hash: Set(hash.to_hex()),
            user_id: Set(self.owner.clone()),
            body: Set(data.to_vec()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = picture::Entity::insert(row)
            .on_conflict(
                OnConflict::column(picture::Column::Hash)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| classify(e, StorageError::WriteFailure))?;

        if inserted == 0 {
            debug!(hash = %hash, "Picture already stored, skipping write");
        }

        Ok(())
    }

    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError> {
        self.find_record(hash)
            .await?
            .map(|record| record.body)
            .ok_or_else(|| StorageError::NotFound(hash.to_hex()))
    }

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        let id = picture::Entity::find()
            .select_only()
            .column(picture::Column::Id)
            .filter(picture::Column::Hash.eq(hash.to_hex()))
            .into_tuple::<i64>()
            .one(&self.db)
            .await
            .map_err(|e| classify(e, StorageError::ReadFailure))?;

        Ok(id.is_some())
    }
}
