//! Resource management API integration tests.
//!
//! Run with: `cargo test -p memos-api --test resource_test`

mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use helpers::auth::bearer;
use helpers::fixtures::spawn_external_host;
use helpers::{setup_test_app, setup_test_app_with_config};
use memos_core::models::{ResourceLocation, ResourceResponse, ACTIVITY_RESOURCE_CREATE};
use memos_db::{SETTING_LOCAL_STORAGE_PATH, SETTING_MAX_UPLOAD_SIZE_MIB, SETTING_STORAGE_SERVICE_ID};
use serde_json::json;

fn file_form(filename: &str, content_type: &str, data: Vec<u8>) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name(filename.to_string())
        .mime_type(content_type.to_string());
    MultipartForm::new().add_part("file", part)
}

#[tokio::test]
async fn test_upload_to_database() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/api/v1/resource/blob")
        .add_header("Authorization", bearer(1))
        .multipart(file_form("note.txt", "text/plain", b"hello".to_vec()))
        .await;
    response.assert_status_ok();

    let resource: ResourceResponse = response.json();
    assert_eq!(resource.filename, "note.txt");
    assert_eq!(resource.content_type, "text/plain");
    assert_eq!(resource.size, 5);
    assert_eq!(resource.creator_id, 1);
    assert_eq!(resource.external_link, "");

    let raw = app.store().raw_resource(resource.id).unwrap();
    assert_eq!(raw.location, Some(ResourceLocation::Inline(b"hello".to_vec())));

    let activities = app.store().activities();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].kind, ACTIVITY_RESOURCE_CREATE);
    assert_eq!(activities[0].payload["filename"], "note.txt");
}

#[tokio::test]
async fn test_upload_to_local_uses_path_template() {
    let app = setup_test_app();
    app.store().set_setting(SETTING_STORAGE_SERVICE_ID, "-1");
    app.store()
        .set_setting(SETTING_LOCAL_STORAGE_PATH, "\"files/{filename}\"");

    let response = app
        .client()
        .post("/api/v1/resource/blob")
        .add_header("Authorization", bearer(1))
        .multipart(file_form("data.bin", "application/octet-stream", vec![7u8; 10]))
        .await;
    response.assert_status_ok();

    let resource: ResourceResponse = response.json();
    let stored = app.data_dir.path().join("files").join("data.bin");
    assert_eq!(std::fs::read(&stored).unwrap(), vec![7u8; 10]);
    // Internal paths never leave the server.
    assert_eq!(resource.external_link, "");
}

#[tokio::test]
async fn test_upload_requires_auth() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/api/v1/resource/blob")
        .multipart(file_form("note.txt", "text/plain", b"hello".to_vec()))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .client()
        .get("/api/v1/resource")
        .add_header("Authorization", "Bearer not-a-token")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(app.store().resource_count(), 0);
}

#[tokio::test]
async fn test_upload_over_limit_rejected() {
    let app = setup_test_app();
    app.store().set_setting(SETTING_MAX_UPLOAD_SIZE_MIB, "1");

    let response = app
        .client()
        .post("/api/v1/resource/blob")
        .add_header("Authorization", bearer(1))
        .multipart(file_form("big.bin", "application/octet-stream", vec![0u8; 1024 * 1024 + 1]))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.store().resource_count(), 0);

    let response = app
        .client()
        .post("/api/v1/resource/blob")
        .add_header("Authorization", bearer(1))
        .multipart(file_form("ok.bin", "application/octet-stream", vec![0u8; 1024 * 1024]))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = setup_test_app();
    let form = MultipartForm::new().add_text("other", "value");

    let response = app
        .client()
        .post("/api/v1/resource/blob")
        .add_header("Authorization", bearer(1))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_external_link() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/api/v1/resource")
        .add_header("Authorization", bearer(1))
        .json(&json!({
            "filename": "cat.png",
            "externalLink": "https://example.com/cat.png",
            "type": "image/png"
        }))
        .await;
    response.assert_status_ok();

    let resource: ResourceResponse = response.json();
    assert_eq!(resource.external_link, "https://example.com/cat.png");
    assert_eq!(resource.size, 0);
}

#[tokio::test]
async fn test_create_rejects_non_http_link() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/api/v1/resource")
        .add_header("Authorization", bearer(1))
        .json(&json!({
            "externalLink": "ftp://example.com/cat.png",
            "downloadToLocal": true
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.store().resource_count(), 0);
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let app = setup_test_app();

    let response = app
        .client()
        .post("/api/v1/resource")
        .add_header("Authorization", bearer(1))
        .add_header("Content-Type", "application/json")
        .text("{not json")
        .await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_create_downloads_external_link() {
    let app = setup_test_app();
    let host = spawn_external_host().await;

    let response = app
        .client()
        .post("/api/v1/resource")
        .add_header("Authorization", bearer(1))
        .json(&json!({
            "externalLink": format!("http://{}/images/cat.png", host),
            "downloadToLocal": true
        }))
        .await;
    response.assert_status_ok();

    let resource: ResourceResponse = response.json();
    assert_eq!(resource.filename, "cat.png");
    assert_eq!(resource.content_type, "image/png");
    assert_eq!(resource.external_link, "");
    assert!(resource.size > 0);

    let raw = app.store().raw_resource(resource.id).unwrap();
    assert!(matches!(raw.location, Some(ResourceLocation::Inline(_))));
}

#[tokio::test]
async fn test_download_guesses_extension() {
    let app = setup_test_app();
    let host = spawn_external_host().await;

    let response = app
        .client()
        .post("/api/v1/resource")
        .add_header("Authorization", bearer(1))
        .json(&json!({
            "externalLink": format!("http://{}/notes/readme", host),
            "downloadToLocal": true
        }))
        .await;
    response.assert_status_ok();

    let resource: ResourceResponse = response.json();
    assert_eq!(resource.filename, "readme.txt");
    assert_eq!(resource.content_type, "text/plain");
    assert_eq!(resource.size, "hello from afar".len() as i64);
}

#[tokio::test]
async fn test_download_respects_upload_limit() {
    let app = setup_test_app();
    app.store().set_setting(SETTING_MAX_UPLOAD_SIZE_MIB, "1");
    let host = spawn_external_host().await;

    let response = app
        .client()
        .post("/api/v1/resource")
        .add_header("Authorization", bearer(1))
        .json(&json!({
            "externalLink": format!("http://{}/big.bin", host),
            "downloadToLocal": true
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.store().resource_count(), 0);
}

#[tokio::test]
async fn test_download_of_missing_link_fails() {
    let app = setup_test_app();
    let host = spawn_external_host().await;

    let response = app
        .client()
        .post("/api/v1/resource")
        .add_header("Authorization", bearer(1))
        .json(&json!({
            "externalLink": format!("http://{}/nothing-here", host),
            "downloadToLocal": true
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_from_private_network_rejected() {
    let app = setup_test_app_with_config(|config| config);
    let host = spawn_external_host().await;

    let response = app
        .client()
        .post("/api/v1/resource")
        .add_header("Authorization", bearer(1))
        .json(&json!({
            "externalLink": format!("http://{}/images/cat.png", host),
            "downloadToLocal": true
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.store().resource_count(), 0);

    // Keeping the link without downloading is not an outbound request.
    app.client()
        .post("/api/v1/resource")
        .add_header("Authorization", bearer(1))
        .json(&json!({
            "filename": "cat.png",
            "externalLink": format!("http://{}/images/cat.png", host),
            "type": "image/png"
        }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_list_only_mine_newest_first() {
    let app = setup_test_app();
    for (user, name) in [(1, "a.txt"), (2, "other.txt"), (1, "b.txt"), (1, "c.txt")] {
        app.client()
            .post("/api/v1/resource/blob")
            .add_header("Authorization", bearer(user))
            .multipart(file_form(name, "text/plain", b"x".to_vec()))
            .await
            .assert_status_ok();
    }

    let response = app
        .client()
        .get("/api/v1/resource")
        .add_header("Authorization", bearer(1))
        .await;
    response.assert_status_ok();
    let names: Vec<String> = response
        .json::<Vec<ResourceResponse>>()
        .into_iter()
        .map(|r| r.filename)
        .collect();
    assert_eq!(names, vec!["c.txt", "b.txt", "a.txt"]);

    let response = app
        .client()
        .get("/api/v1/resource")
        .add_query_param("limit", 1)
        .add_query_param("offset", 1)
        .add_header("Authorization", bearer(1))
        .await;
    let page = response.json::<Vec<ResourceResponse>>();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].filename, "b.txt");
}

#[tokio::test]
async fn test_patch_renames_for_owner_only() {
    let app = setup_test_app();
    let created: ResourceResponse = app
        .client()
        .post("/api/v1/resource/blob")
        .add_header("Authorization", bearer(1))
        .multipart(file_form("a.txt", "text/plain", b"x".to_vec()))
        .await
        .json();

    let response = app
        .client()
        .patch(&format!("/api/v1/resource/{}", created.id))
        .add_header("Authorization", bearer(2))
        .json(&json!({ "filename": "stolen.txt" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .client()
        .patch(&format!("/api/v1/resource/{}", created.id))
        .add_header("Authorization", bearer(1))
        .json(&json!({ "filename": "renamed.txt" }))
        .await;
    response.assert_status_ok();
    let updated: ResourceResponse = response.json();
    assert_eq!(updated.filename, "renamed.txt");
    assert!(updated.updated_ts >= created.updated_ts);

    let response = app
        .client()
        .patch("/api/v1/resource/999")
        .add_header("Authorization", bearer(1))
        .json(&json!({ "filename": "x.txt" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_removes_record_and_local_file() {
    let app = setup_test_app();
    app.store().set_setting(SETTING_STORAGE_SERVICE_ID, "-1");

    let created: ResourceResponse = app
        .client()
        .post("/api/v1/resource/blob")
        .add_header("Authorization", bearer(1))
        .multipart(file_form("gone.bin", "application/octet-stream", vec![1u8; 3]))
        .await
        .json();
    let stored = app.data_dir.path().join("assets").join("gone.bin");
    assert!(stored.exists());

    let response = app
        .client()
        .delete(&format!("/api/v1/resource/{}", created.id))
        .add_header("Authorization", bearer(2))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert!(stored.exists());

    let response = app
        .client()
        .delete(&format!("/api/v1/resource/{}", created.id))
        .add_header("Authorization", bearer(1))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert!(!stored.exists());
    assert!(app.store().raw_resource(created.id).is_none());

    let response = app
        .client()
        .get(&format!("/o/r/{}", created.id))
        .add_header("Authorization", bearer(1))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_succeeds_when_file_already_gone() {
    let app = setup_test_app();
    app.store().set_setting(SETTING_STORAGE_SERVICE_ID, "-1");

    let created: ResourceResponse = app
        .client()
        .post("/api/v1/resource/blob")
        .add_header("Authorization", bearer(1))
        .multipart(file_form("tmp.bin", "application/octet-stream", vec![1u8; 3]))
        .await
        .json();
    std::fs::remove_file(app.data_dir.path().join("assets").join("tmp.bin")).unwrap();

    let response = app
        .client()
        .delete(&format!("/api/v1/resource/{}", created.id))
        .add_header("Authorization", bearer(1))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert_eq!(app.store().resource_count(), 0);
}

#[tokio::test]
async fn test_activity_failure_reported_after_record_created() {
    let app = setup_test_app();
    app.store().fail_activity_writes(true);

    let response = app
        .client()
        .post("/api/v1/resource/blob")
        .add_header("Authorization", bearer(1))
        .multipart(file_form("a.txt", "text/plain", b"x".to_vec()))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.store().resource_count(), 1);
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = setup_test_app();

    app.client().get("/healthz").await.assert_status_ok();

    let response = app.client().get("/api/openapi.json").await;
    response.assert_status_ok();
    let doc: serde_json::Value = response.json();
    assert!(doc["paths"]["/api/v1/resource/blob"].is_object());
}
