//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p rendition-api`.
//! Local-backend apps keep their files in a temp dir that lives as long as `TestApp`.

#![allow(dead_code)]

pub mod storage;

use axum_test::TestServer;
use rendition_api::setup::routes;
use rendition_api::AppState;
use rendition_core::{Config, StorageBackend, StorageConfig};
use rendition_storage::{LocalStorage, MockStorage, Storage};
use std::sync::Arc;
use tempfile::TempDir;

pub const INPUT_BUCKET: &str = "uploads";
pub const OUTPUT_BUCKET: &str = "renditions";
pub const BASE_URL: &str = "http://localhost:4000/files";
pub const SIGNING_SECRET: &str = "test-signing-secret-0123456789abcdef";

/// Test application: server, the local store behind it, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub local: Arc<LocalStorage>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Seed an object as the upload path or the pipeline would.
    pub async fn put(&self, bucket: &str, key: &str, data: &[u8]) {
        self.local
            .put_object(bucket, key, data)
            .await
            .expect("Failed to seed object");
    }
}

pub fn test_config(backend: StorageBackend, path: Option<String>) -> Config {
    Config {
        server_port: 4000,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        storage: StorageConfig {
            backend,
            region: None,
            input_bucket: INPUT_BUCKET.to_string(),
            output_bucket: OUTPUT_BUCKET.to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            local_storage_path: path,
            local_storage_base_url: Some(BASE_URL.to_string()),
            local_signing_secret: Some(SIGNING_SECRET.to_string()),
        },
    }
}

/// Setup test app with the local backend on a temp dir.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = test_config(
        StorageBackend::Local,
        Some(temp_dir.path().to_string_lossy().to_string()),
    );

    let local = Arc::new(
        LocalStorage::new(
            temp_dir.path(),
            BASE_URL.to_string(),
            SIGNING_SECRET,
            &[INPUT_BUCKET.to_string(), OUTPUT_BUCKET.to_string()],
        )
        .await
        .expect("Failed to create local storage"),
    );
    let storage: Arc<dyn Storage> = local.clone();

    let state = Arc::new(AppState::new(config.clone(), storage, Some(local.clone())));
    let app = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        local,
        _temp_dir: temp_dir,
    }
}

/// Setup a server over an in-memory gateway, for failure injection.
pub fn setup_mock_app(storage: &MockStorage) -> TestServer {
    let config = test_config(StorageBackend::S3, None);
    let storage: Arc<dyn Storage> = Arc::new(storage.clone());

    let state = Arc::new(AppState::new(config.clone(), storage, None));
    let app = routes::setup_routes(&config, state).expect("Failed to build routes");
    TestServer::new(app.into_make_service()).expect("Failed to create test server")
}

/// Path and query of a URL served by this app (strips scheme and host).
pub fn local_path(url: &str) -> &str {
    url.strip_prefix("http://localhost:4000")
        .expect("URL should point at the local file routes")
}
