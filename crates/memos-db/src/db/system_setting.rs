//! System settings and remote storage records.

use async_trait::async_trait;
use memos_core::models::{RemoteStorage, RemoteStorageKind, StorageConfigDocument};
use memos_core::AppError;
use sqlx::{PgPool, Postgres};

use crate::repository::SystemSettingRepository;

#[derive(Debug, sqlx::FromRow)]
pub struct StorageRow {
    pub id: i32,
    pub name: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub config: String,
}

impl StorageRow {
    pub fn into_remote_storage(self) -> Result<RemoteStorage, AppError> {
        let kind: RemoteStorageKind = self
            .kind
            .parse()
            .map_err(|e: anyhow::Error| AppError::Configuration(e.to_string()))?;

        let document: StorageConfigDocument = serde_json::from_str(&self.config).map_err(|e| {
            AppError::Configuration(format!("Invalid config for storage {}: {}", self.id, e))
        })?;

        let config = document.s3_config.ok_or_else(|| {
            AppError::Configuration(format!("Storage {} has no S3 config", self.id))
        })?;

        Ok(RemoteStorage {
            id: self.id,
            name: self.name,
            kind,
            config,
        })
    }
}

#[derive(Clone)]
pub struct PgSystemSettingRepository {
    pool: PgPool,
}

impl PgSystemSettingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SystemSettingRepository for PgSystemSettingRepository {
    #[tracing::instrument(skip(self), fields(db.table = "system_setting"))]
    async fn get_system_setting(&self, name: &str) -> Result<Option<String>, AppError> {
        let value: Option<String> = sqlx::query_scalar::<Postgres, String>(
            "SELECT value FROM system_setting WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    #[tracing::instrument(skip(self), fields(db.table = "storage", db.record_id = id))]
    async fn get_remote_storage(&self, id: i32) -> Result<Option<RemoteStorage>, AppError> {
        let row: Option<StorageRow> = sqlx::query_as::<Postgres, StorageRow>(
            "SELECT id, name, type, config FROM storage WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StorageRow::into_remote_storage).transpose()
    }
}
