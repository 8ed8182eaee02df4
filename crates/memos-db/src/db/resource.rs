//! Resource repository: CRUD for the resource table.

use async_trait::async_trait;
use memos_core::models::{FindResource, Resource, ResourceCreate, ResourceLocation, UpdateResource};
use memos_core::AppError;
use sqlx::{PgPool, Postgres};

use crate::repository::ResourceRepository;

const RESOURCE_COLUMNS: &str = r#"
    id, creator_id, created_ts, updated_ts, filename,
    internal_path, external_link, type AS content_type, size,
    (SELECT COUNT(*) FROM memo_resource WHERE memo_resource.resource_id = resource.id) AS linked_memo_amount
"#;

/// Row type for the resource table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct ResourceRow {
    pub id: i32,
    pub creator_id: i32,
    pub created_ts: i64,
    pub updated_ts: i64,
    pub filename: String,
    pub blob: Option<Vec<u8>>,
    pub internal_path: String,
    pub external_link: String,
    pub content_type: String,
    pub size: i64,
    pub linked_memo_amount: i64,
}

impl ResourceRow {
    pub fn into_resource(self) -> Resource {
        let location = match (self.blob, self.internal_path, self.external_link) {
            (Some(blob), _, _) if !blob.is_empty() => Some(ResourceLocation::Inline(blob)),
            (_, path, _) if !path.is_empty() => Some(ResourceLocation::Local(path)),
            (_, _, link) if !link.is_empty() => Some(ResourceLocation::External(link)),
            _ => None,
        };

        Resource {
            id: self.id,
            creator_id: self.creator_id,
            created_ts: self.created_ts,
            updated_ts: self.updated_ts,
            filename: self.filename,
            content_type: self.content_type,
            size: self.size,
            location,
            linked_memo_amount: self.linked_memo_amount,
        }
    }
}

/// Split a location into the three exclusive columns (blob, internal_path, external_link).
fn location_columns(location: Option<ResourceLocation>) -> (Option<Vec<u8>>, String, String) {
    match location {
        Some(ResourceLocation::Inline(blob)) => (Some(blob), String::new(), String::new()),
        Some(ResourceLocation::Local(path)) => (None, path, String::new()),
        Some(ResourceLocation::External(link)) => (None, String::new(), link),
        None => (None, String::new(), String::new()),
    }
}

/// Repository for the resource table.
#[derive(Clone)]
pub struct PgResourceRepository {
    pool: PgPool,
}

impl PgResourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select_sql(suffix: &str) -> String {
        format!(
            r#"
            SELECT {columns},
                   CASE WHEN $1 THEN blob ELSE NULL END AS blob
            FROM resource
            WHERE ($2::INTEGER IS NULL OR id = $2)
              AND ($3::INTEGER IS NULL OR creator_id = $3)
              AND ($4::TEXT IS NULL OR filename = $4)
            ORDER BY created_ts DESC, id DESC
            {suffix}
            "#,
            columns = RESOURCE_COLUMNS,
            suffix = suffix
        )
    }
}

#[async_trait]
impl ResourceRepository for PgResourceRepository {
    #[tracing::instrument(skip(self, create), fields(db.table = "resource", creator_id = create.creator_id))]
    async fn create_resource(&self, create: ResourceCreate) -> Result<Resource, AppError> {
        let (blob, internal_path, external_link) = location_columns(create.location);
        let now = chrono::Utc::now().timestamp();

        let sql = format!(
            r#"
            INSERT INTO resource
                (creator_id, created_ts, updated_ts, filename, blob, internal_path, external_link, type, size)
            VALUES ($1, $2, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {columns}, NULL::BYTEA AS blob
            "#,
            columns = RESOURCE_COLUMNS
        );

        let row: ResourceRow = sqlx::query_as::<Postgres, ResourceRow>(&sql)
            .bind(create.creator_id)
            .bind(now)
            .bind(&create.filename)
            .bind(blob)
            .bind(internal_path)
            .bind(external_link)
            .bind(&create.content_type)
            .bind(create.size)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into_resource())
    }

    #[tracing::instrument(skip(self), fields(db.table = "resource"))]
    async fn get_resource(&self, find: &FindResource) -> Result<Option<Resource>, AppError> {
        let row: Option<ResourceRow> =
            sqlx::query_as::<Postgres, ResourceRow>(&Self::select_sql("LIMIT 1"))
                .bind(find.get_blob)
                .bind(find.id)
                .bind(find.creator_id)
                .bind(find.filename.as_deref())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(ResourceRow::into_resource))
    }

    #[tracing::instrument(skip(self), fields(db.table = "resource"))]
    async fn list_resources(&self, find: &FindResource) -> Result<Vec<Resource>, AppError> {
        let rows: Vec<ResourceRow> =
            sqlx::query_as::<Postgres, ResourceRow>(&Self::select_sql("LIMIT $5 OFFSET $6"))
                .bind(find.get_blob)
                .bind(find.id)
                .bind(find.creator_id)
                .bind(find.filename.as_deref())
                .bind(find.limit)
                .bind(find.offset.unwrap_or(0))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(ResourceRow::into_resource).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "resource", db.record_id = update.id))]
    async fn update_resource(&self, update: &UpdateResource) -> Result<Resource, AppError> {
        let sql = format!(
            r#"
            UPDATE resource
            SET filename = COALESCE($2, filename), updated_ts = $3
            WHERE id = $1
            RETURNING {columns}, NULL::BYTEA AS blob
            "#,
            columns = RESOURCE_COLUMNS
        );

        let row: Option<ResourceRow> = sqlx::query_as::<Postgres, ResourceRow>(&sql)
            .bind(update.id)
            .bind(update.filename.as_deref())
            .bind(update.updated_ts)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ResourceRow::into_resource)
            .ok_or_else(|| AppError::NotFound(format!("Resource not found: {}", update.id)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "resource", db.record_id = id))]
    async fn delete_resource(&self, id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM resource WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ResourceRow {
        ResourceRow {
            id: 1,
            creator_id: 101,
            created_ts: 1,
            updated_ts: 2,
            filename: "test.epub".to_string(),
            blob: None,
            internal_path: String::new(),
            external_link: String::new(),
            content_type: "application/epub+zip".to_string(),
            size: 4,
            linked_memo_amount: 0,
        }
    }

    #[test]
    fn test_row_location_mapping() {
        let mut r = row();
        r.blob = Some(b"test".to_vec());
        assert_eq!(
            r.into_resource().location,
            Some(ResourceLocation::Inline(b"test".to_vec()))
        );

        let mut r = row();
        r.internal_path = "/data/assets/test.epub".to_string();
        assert_eq!(
            r.into_resource().location,
            Some(ResourceLocation::Local("/data/assets/test.epub".to_string()))
        );

        let mut r = row();
        r.external_link = "https://x.test/a".to_string();
        assert_eq!(
            r.into_resource().location,
            Some(ResourceLocation::External("https://x.test/a".to_string()))
        );

        assert_eq!(row().into_resource().location, None);
    }

    #[test]
    fn test_location_columns_are_exclusive() {
        let (blob, path, link) = location_columns(Some(ResourceLocation::Local("/a".into())));
        assert!(blob.is_none());
        assert_eq!(path, "/a");
        assert!(link.is_empty());
    }
}
