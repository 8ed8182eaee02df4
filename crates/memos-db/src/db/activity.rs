use async_trait::async_trait;
use memos_core::models::ActivityCreate;
use memos_core::AppError;
use sqlx::PgPool;

use crate::repository::ActivityRepository;

#[derive(Clone)]
pub struct PgActivityRepository {
    pool: PgPool,
}

impl PgActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    #[tracing::instrument(skip(self, activity), fields(db.table = "activity", kind = %activity.kind))]
    async fn create_activity(&self, activity: ActivityCreate) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO activity (creator_id, created_ts, type, level, payload)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(activity.creator_id)
        .bind(chrono::Utc::now().timestamp())
        .bind(&activity.kind)
        .bind(&activity.level)
        .bind(activity.payload.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
