//! Shared helpers for Web API integration tests.

use axum_test::TestServer;
use snapaja::config::{Config, UploadConfig};
use snapaja::store::BlobStorage;
use snapaja::web::handlers::AppState;
use snapaja::web::router::{create_health_router, create_router};
use snapaja::Database;
use std::sync::Arc;
use tempfile::TempDir;

/// Create a test configuration with a known token secret.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.upload.token_secret = "test-secret-key-for-testing-only".to_string();
    config
}

/// Handles kept alive for the duration of one test.
pub struct TestContext {
    pub db: Database,
    pub blob: BlobStorage,
    // Blob directory is removed when the context is dropped.
    _blob_dir: TempDir,
}

/// Create a test server backed by an in-memory database and a temporary
/// blob directory.
pub async fn create_test_server() -> (TestServer, TestContext) {
    create_test_server_with_config(create_test_config()).await
}

/// Create a test server with custom upload limits.
pub async fn create_test_server_with_upload(upload: UploadConfig) -> (TestServer, TestContext) {
    let mut config = create_test_config();
    let secret = config.upload.token_secret.clone();
    config.upload = upload;
    if config.upload.token_secret.is_empty() {
        config.upload.token_secret = secret;
    }
    create_test_server_with_config(config).await
}

async fn create_test_server_with_config(config: Config) -> (TestServer, TestContext) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    let blob_dir = TempDir::new().expect("Failed to create blob directory");
    let blob = BlobStorage::new(blob_dir.path(), "http://localhost:3000")
        .expect("Failed to create blob storage");

    let app_state = Arc::new(AppState::new(&db, blob.clone(), &config.upload));

    let router = create_router(app_state, &config.server.cors_origins)
        .merge(create_health_router());

    let server = TestServer::new(router).expect("Failed to create test server");

    (
        server,
        TestContext {
            db,
            blob,
            _blob_dir: blob_dir,
        },
    )
}
