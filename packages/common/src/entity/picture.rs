use sea_orm::entity::prelude::*;

/// One stored upload. `hash` is the content key; `body` is the payload as received.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pictures")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// MD5 content hash, lowercase hex.
    #[sea_orm(unique)]
    pub hash: String,

    /// Uploading principal. A configured placeholder until uploads are authenticated.
    pub user_id: String,

    pub body: Vec<u8>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
