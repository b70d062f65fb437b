//! Shared test helpers for in-crate tests.

use std::sync::Arc;

use crate::backend::Backend;
use crate::config::{BackendConfig, BackendKind, Config, ServerConfig};
use crate::object_store::LocalStore;
use crate::storage::Database;
use crate::AppState;

/// Create a test AppState backed by a temporary database and local object store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let files_dir = temp_dir.path().join("files");
    let public_url = "http://127.0.0.1:0".to_string();

    let config = Config {
        backend: BackendConfig {
            kind: BackendKind::Local,
            data_dir: data_dir.to_string_lossy().to_string(),
            local_storage_path: files_dir.to_string_lossy().to_string(),
            ..Default::default()
        },
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            public_url: public_url.clone(),
        },
        site_url: "https://remix.example/".to_string(),
        max_upload_size: 10 * 1024 * 1024, // 10MB for tests
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let objects =
        LocalStore::new(&files_dir, &public_url).expect("Failed to create test object store");

    Arc::new(AppState::new(config, Backend::local(db, objects)))
}
