//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::services::{ExternalFetcher, ResourceRepositories, ResourceService};
use crate::state::AppState;
use anyhow::{Context, Result};
use memos_core::Config;
use memos_db::{
    PgActivityRepository, PgMemoResourceRepository, PgResourceRepository,
    PgSystemSettingRepository,
};
use memos_processing::ThumbnailCache;
use std::sync::Arc;
use std::time::Duration;

/// Initialize the entire application: telemetry, database, services and routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())?;
    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let pool = memos_db::connect(config.database_url(), config.db_max_connections())
        .await
        .context("Failed to connect to the database")?;

    let repositories = ResourceRepositories {
        resources: Arc::new(PgResourceRepository::new(pool.clone())),
        memo_resources: Arc::new(PgMemoResourceRepository::new(pool.clone())),
        activities: Arc::new(PgActivityRepository::new(pool.clone())),
        settings: Arc::new(PgSystemSettingRepository::new(pool)),
    };

    let state = build_state(config.clone(), repositories)?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Wire the resource service over the given repositories.
pub fn build_state(config: Config, repositories: ResourceRepositories) -> Result<Arc<AppState>> {
    let thumbnails = ThumbnailCache::new(config.data_dir(), config.thumbnail_max_concurrency());
    let fetcher = ExternalFetcher::new(
        Duration::from_secs(config.remote_fetch_timeout_secs()),
        config.external_fetch_allow_private_ips(),
    )?;
    let resources = ResourceService::new(
        repositories,
        thumbnails,
        fetcher,
        config.data_dir().clone(),
    );

    Ok(Arc::new(AppState::new(config, resources)))
}
