use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::StoreError;

/// Metadata of an uploaded attachment; the bytes live in object storage under `file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub file: String,
    pub name: String,
    pub content_type: String,
    pub subtype: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewFile {
    pub id: Uuid,
    pub file: String,
    pub name: String,
    pub content_type: String,
    pub subtype: String,
}

#[async_trait]
pub trait FileRepo: Send + Sync {
    async fn create_file(&self, new: NewFile) -> Result<FileRecord, StoreError>;
    async fn find_file(&self, id: Uuid) -> Result<Option<FileRecord>, StoreError>;
}

#[derive(Clone)]
pub struct PgFileRepo {
    db: PgPool,
}

impl PgFileRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FileRepo for PgFileRepo {
    async fn create_file(&self, new: NewFile) -> Result<FileRecord, StoreError> {
        let row = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO files (id, file, name, content_type, subtype)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, file, name, content_type, subtype, created_at
            "#,
        )
        .bind(new.id)
        .bind(&new.file)
        .bind(&new.name)
        .bind(&new.content_type)
        .bind(&new.subtype)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_file(&self, id: Uuid) -> Result<Option<FileRecord>, StoreError> {
        let row = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, file, name, content_type, subtype, created_at
              FROM files
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}
