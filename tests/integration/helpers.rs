//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use morphic_core::config::{RemoteConfig, SessionConfig};
use morphic_service::{InMemorySettingsManager, Session, SessionContext};
use morphic_storage::backends::{LocalBackend, RemoteBackend};
use morphic_storage::{BackendManager, Storage};

/// Test application context
pub struct TestApp {
    /// Session under test
    pub session: Session,
    /// Settings manager backing the session
    pub settings: InMemorySettingsManager,
}

impl TestApp {
    /// A session over in-memory storage and the well-known settings
    pub fn new() -> Self {
        Self::with_storage(Storage::in_memory())
    }

    /// A session over the given storage
    pub fn with_storage(storage: Storage) -> Self {
        let settings = InMemorySettingsManager::with_well_known();
        let context = SessionContext::new(
            storage,
            Arc::new(settings.clone()),
            SessionConfig::default(),
        );
        Self {
            session: Session::new(context),
            settings,
        }
    }

    /// A session that has been opened with the default record
    pub async fn opened() -> Self {
        let app = Self::new();
        app.session
            .open(None)
            .await
            .expect("Failed to open session");
        app
    }

    /// The session's collaborators
    pub fn context(&self) -> &SessionContext {
        self.session.context()
    }
}

/// Storage over a local directory
pub async fn local_storage(root: &std::path::Path) -> Storage {
    let backend = LocalBackend::new(&root.to_string_lossy())
        .await
        .expect("Failed to init local backend");
    Storage::new(BackendManager::from_backend(Arc::new(backend)))
}

/// Remote backend pointed at a mock server
pub fn remote_manager(base_url: String) -> BackendManager {
    let backend = RemoteBackend::new(&RemoteConfig {
        enabled: true,
        endpoint: base_url,
        auth_token: Some("test-token".to_string()),
        timeout_seconds: 5,
    })
    .expect("Failed to init remote backend");
    BackendManager::from_backend(Arc::new(backend))
}
