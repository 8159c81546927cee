//! Backend manager that dispatches to the configured record backend.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use morphic_core::config::{RemoteConfig, StorageConfig};
use morphic_core::error::AppError;
use morphic_core::result::AppResult;
use morphic_core::traits::RecordBackend;

/// Backend manager that wraps the configured record backend.
///
/// The backend is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct BackendManager {
    /// The inner record backend.
    inner: Arc<dyn RecordBackend>,
}

impl BackendManager {
    /// Create the local backend manager from configuration.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let inner: Arc<dyn RecordBackend> = match config.provider.as_str() {
            "local" => {
                info!(root = %config.data_root, "Initializing local record backend");
                Arc::new(crate::backends::LocalBackend::new(&config.data_root).await?)
            }
            "memory" => {
                info!("Initializing in-memory record backend");
                Arc::new(crate::backends::MemoryBackend::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown storage provider: '{other}'. Supported: local, memory"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create the remote backend manager, or `None` when sync is disabled.
    pub fn remote(config: &RemoteConfig) -> AppResult<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }

        #[cfg(feature = "remote")]
        {
            info!(endpoint = %config.endpoint, "Initializing remote record backend");
            let backend = crate::backends::RemoteBackend::new(config)?;
            Ok(Some(Self::from_backend(Arc::new(backend))))
        }

        #[cfg(not(feature = "remote"))]
        {
            Err(AppError::configuration(
                "Remote sync is enabled but the 'remote' feature is not compiled in",
            ))
        }
    }

    /// Create a backend manager from an existing backend (for testing).
    pub fn from_backend(backend: Arc<dyn RecordBackend>) -> Self {
        Self { inner: backend }
    }

    /// Get a reference to the inner backend.
    pub fn backend(&self) -> &dyn RecordBackend {
        self.inner.as_ref()
    }
}

#[async_trait]
impl RecordBackend for BackendManager {
    fn backend_type(&self) -> &str {
        self.inner.backend_type()
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn read(&self, key: &str) -> AppResult<Option<Bytes>> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, data: Bytes) -> AppResult<()> {
        self.inner.write(key, data).await
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        self.inner.list(prefix).await
    }
}
