//! Memos database layer
//!
//! Persistence contracts for resources, memo links, activities and system
//! settings, with PostgreSQL repositories and embedded migrations.

pub mod db;
pub mod repository;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use db::{
    PgActivityRepository, PgMemoResourceRepository, PgResourceRepository,
    PgSystemSettingRepository,
};
pub use repository::{
    ActivityRepository, MemoResourceRepository, ResourceRepository, SystemSettingRepository,
    SETTING_LOCAL_STORAGE_PATH, SETTING_MAX_UPLOAD_SIZE_MIB, SETTING_STORAGE_SERVICE_ID,
};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Embedded schema migrations (`migrations/` at the workspace root).
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Connect to PostgreSQL and apply pending migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;

    MIGRATOR.run(&pool).await?;
    tracing::info!(max_connections, "Database connected and migrations applied");

    Ok(pool)
}
