//! PostgreSQL repository tests.
//!
//! These need a live database and are ignored by default:
//! `DATABASE_URL=postgres://... cargo test -p memos-db -- --ignored`

use memos_core::models::{
    ActivityCreate, FindResource, ResourceCreate, ResourceLocation, UpdateResource, Visibility,
};
use memos_core::{AppError, StorageBackend};
use memos_db::{
    ActivityRepository, MemoResourceRepository, PgActivityRepository, PgMemoResourceRepository,
    PgResourceRepository, PgSystemSettingRepository, ResourceRepository, SystemSettingRepository,
    SETTING_LOCAL_STORAGE_PATH, SETTING_STORAGE_SERVICE_ID,
};
use sqlx::PgPool;

async fn setup_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
    let pool = memos_db::connect(&url, 5)
        .await
        .expect("Failed to connect to test database");

    sqlx::query("TRUNCATE resource, memo, memo_resource, activity, system_setting, storage RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to reset tables");

    pool
}

fn epub(creator_id: i32) -> ResourceCreate {
    ResourceCreate {
        creator_id,
        filename: "test.epub".to_string(),
        content_type: "application/epub+zip".to_string(),
        size: 4,
        location: Some(ResourceLocation::Inline(b"test".to_vec())),
    }
}

#[tokio::test]
#[ignore]
async fn test_resource_store() {
    let pool = setup_pool().await;
    let repo = PgResourceRepository::new(pool);

    let created = repo.create_resource(epub(101)).await.unwrap();
    assert_eq!(created.filename, "test.epub");
    assert_eq!(created.location, None);

    let by_name = FindResource {
        filename: Some("test.epub".to_string()),
        ..Default::default()
    };
    assert!(repo.get_resource(&by_name).await.unwrap().is_some());

    let other_name = FindResource {
        filename: Some("test.png".to_string()),
        ..Default::default()
    };
    assert!(repo.get_resource(&other_name).await.unwrap().is_none());

    let wrong_creator = FindResource::by_id(created.id).with_creator(102);
    assert!(repo.get_resource(&wrong_creator).await.unwrap().is_none());

    let with_blob = repo
        .get_resource(&FindResource::by_id(created.id).with_blob())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        with_blob.location,
        Some(ResourceLocation::Inline(b"test".to_vec()))
    );

    repo.delete_resource(created.id).await.unwrap();
    assert!(repo
        .get_resource(&FindResource::by_id(created.id))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[ignore]
async fn test_update_keeps_filename_when_absent() {
    let pool = setup_pool().await;
    let repo = PgResourceRepository::new(pool);
    let created = repo.create_resource(epub(1)).await.unwrap();

    let updated = repo
        .update_resource(&UpdateResource {
            id: created.id,
            filename: None,
            updated_ts: created.updated_ts + 10,
        })
        .await
        .unwrap();
    assert_eq!(updated.filename, "test.epub");
    assert_eq!(updated.updated_ts, created.updated_ts + 10);

    let missing = repo
        .update_resource(&UpdateResource {
            id: created.id + 100,
            filename: Some("x".to_string()),
            updated_ts: 0,
        })
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_single_location_constraint() {
    let pool = setup_pool().await;

    let result = sqlx::query(
        "INSERT INTO resource (creator_id, filename, blob, internal_path) VALUES (1, 'a', 'x'::BYTEA, '/tmp/a')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore]
async fn test_memo_visibilities() {
    let pool = setup_pool().await;
    let resources = PgResourceRepository::new(pool.clone());
    let memos = PgMemoResourceRepository::new(pool.clone());
    let resource = resources.create_resource(epub(1)).await.unwrap();

    for (id, visibility) in [(1, "PRIVATE"), (2, "PUBLIC")] {
        sqlx::query("INSERT INTO memo (id, creator_id, visibility) VALUES ($1, 1, $2)")
            .bind(id)
            .bind(visibility)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO memo_resource (memo_id, resource_id) VALUES ($1, $2)")
            .bind(id)
            .bind(resource.id)
            .execute(&pool)
            .await
            .unwrap();
    }

    let links = memos.list_memo_resources(resource.id).await.unwrap();
    let ids: Vec<i32> = links.iter().map(|l| l.memo_id).collect();
    assert_eq!(ids, vec![1, 2]);

    let mut visibilities = memos.get_memo_visibilities(&ids).await.unwrap();
    visibilities.sort();
    assert_eq!(visibilities, vec![Visibility::Private, Visibility::Public]);

    let listed = resources
        .get_resource(&FindResource::by_id(resource.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(listed.linked_memo_amount, 2);
}

#[tokio::test]
#[ignore]
async fn test_activity_and_settings() {
    let pool = setup_pool().await;
    let activities = PgActivityRepository::new(pool.clone());
    let settings = PgSystemSettingRepository::new(pool.clone());

    activities
        .create_activity(ActivityCreate::resource_created(1, &epub(1)))
        .await
        .unwrap();
    let payload: String = sqlx::query_scalar("SELECT payload FROM activity LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    let payload: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(payload["filename"], "test.epub");

    for (name, value) in [
        (SETTING_STORAGE_SERVICE_ID, "-1"),
        (SETTING_LOCAL_STORAGE_PATH, "\"assets/{year}/{filename}\""),
    ] {
        sqlx::query("INSERT INTO system_setting (name, value) VALUES ($1, $2)")
            .bind(name)
            .bind(value)
            .execute(&pool)
            .await
            .unwrap();
    }

    let config = settings.get_storage_configuration().await.unwrap();
    assert_eq!(config.backend, StorageBackend::Local);
    assert_eq!(config.local_path_template(), "assets/{year}/{filename}");

    sqlx::query("INSERT INTO storage (id, name, type, config) VALUES (3, 'ftp', 'FTP', '{}')")
        .execute(&pool)
        .await
        .unwrap();
    assert!(matches!(
        settings.get_remote_storage(3).await,
        Err(AppError::Configuration(_))
    ));
}
