//! Test helpers: build the full router over the in-memory store.
//!
//! Run from workspace root: `cargo test -p memos-api`.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use memos_api::services::ResourceRepositories;
use memos_api::setup::{build_state, routes};
use memos_core::Config;
use memos_db::test_helpers::InMemoryStore;
use std::sync::Arc;
use tempfile::TempDir;

/// Test application: server, backing store and the data root it writes into.
pub struct TestApp {
    pub server: TestServer,
    pub store: InMemoryStore,
    pub data_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }
}

/// Test app whose external-link downloads may reach the loopback fixture host.
pub fn setup_test_app() -> TestApp {
    setup_test_app_with_config(|config| config.with_external_fetch_allow_private_ips(true))
}

/// Same as `setup_test_app` with a custom thumbnail permit pool.
pub fn setup_test_app_with_permits(permits: usize) -> TestApp {
    setup_test_app_with_config(|config| {
        config
            .with_external_fetch_allow_private_ips(true)
            .with_thumbnail_max_concurrency(permits)
    })
}

/// Build a test app from the default test config after `customize`.
pub fn setup_test_app_with_config(customize: impl FnOnce(Config) -> Config) -> TestApp {
    let data_dir = TempDir::new().expect("Failed to create temp dir");
    let store = InMemoryStore::new();

    let config = customize(Config::for_data_dir(data_dir.path(), auth::TEST_JWT_SECRET));

    let shared = Arc::new(store.clone());
    let repositories = ResourceRepositories {
        resources: shared.clone(),
        memo_resources: shared.clone(),
        activities: shared.clone(),
        settings: shared,
    };

    let state = build_state(config.clone(), repositories).expect("Failed to build state");
    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        store,
        data_dir,
    }
}
