//! Memo-to-resource links and memo visibility lookups.

use async_trait::async_trait;
use memos_core::models::{MemoResource, Visibility};
use memos_core::AppError;
use sqlx::{PgPool, Postgres};

use crate::repository::MemoResourceRepository;

#[derive(Debug, sqlx::FromRow)]
pub struct MemoResourceRow {
    pub memo_id: i32,
    pub resource_id: i32,
}

#[derive(Clone)]
pub struct PgMemoResourceRepository {
    pool: PgPool,
}

impl PgMemoResourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemoResourceRepository for PgMemoResourceRepository {
    #[tracing::instrument(skip(self), fields(db.table = "memo_resource"))]
    async fn list_memo_resources(&self, resource_id: i32) -> Result<Vec<MemoResource>, AppError> {
        let rows: Vec<MemoResourceRow> = sqlx::query_as::<Postgres, MemoResourceRow>(
            "SELECT memo_id, resource_id FROM memo_resource WHERE resource_id = $1 ORDER BY memo_id",
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MemoResource {
                memo_id: r.memo_id,
                resource_id: r.resource_id,
            })
            .collect())
    }

    #[tracing::instrument(skip(self, memo_ids), fields(db.table = "memo", count = memo_ids.len()))]
    async fn get_memo_visibilities(&self, memo_ids: &[i32]) -> Result<Vec<Visibility>, AppError> {
        if memo_ids.is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<String> =
            sqlx::query_scalar::<Postgres, String>("SELECT visibility FROM memo WHERE id = ANY($1)")
                .bind(memo_ids)
                .fetch_all(&self.pool)
                .await?;

        values
            .iter()
            .map(|v| {
                v.parse::<Visibility>()
                    .map_err(|e| AppError::Internal(format!("Corrupt memo visibility: {}", e)))
            })
            .collect()
    }
}
