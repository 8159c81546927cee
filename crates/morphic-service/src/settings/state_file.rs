//! Settings manager persisted to a JSON state file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use morphic_core::error::{AppError, ErrorKind};
use morphic_core::result::AppResult;
use morphic_entity::{PreferenceKey, PreferenceValue};

use super::manager::SettingsManager;
use super::memory::InMemorySettingsManager;

/// Well-known settings kept in memory and written to disk after every
/// successful write, so separate processes observe the same "system".
///
/// A write whose state file cannot be persisted is rolled back and reported
/// as an error, so memory never runs ahead of the file.
#[derive(Debug)]
pub struct StateFileSettingsManager {
    inner: InMemorySettingsManager,
    path: PathBuf,
    persist: Mutex<()>,
}

impl StateFileSettingsManager {
    /// Open the state file at `path`, creating the manager at defaults when
    /// the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = InMemorySettingsManager::with_well_known();

        match fs::read(&path).await {
            Ok(data) => {
                let snapshot: BTreeMap<String, PreferenceValue> = serde_json::from_slice(&data)?;
                let restored = inner.restore(&snapshot);
                info!(path = %path.display(), restored, "Loaded settings state");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings state yet, using defaults");
            }
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read settings state: {}", path.display()),
                    e,
                ));
            }
        }

        Ok(Self {
            inner,
            path,
            persist: Mutex::new(()),
        })
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current values of every known setting.
    pub fn snapshot(&self) -> BTreeMap<String, PreferenceValue> {
        self.inner.snapshot()
    }

    /// Write the snapshot to disk. Callers hold the `persist` guard.
    async fn save(&self) -> AppResult<()> {
        let data = serde_json::to_vec_pretty(&self.inner.snapshot())?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write settings state: {}", self.path.display()),
                e,
            )
        })
    }
}

#[async_trait]
impl SettingsManager for StateFileSettingsManager {
    async fn read_value(&self, key: &PreferenceKey) -> AppResult<Option<PreferenceValue>> {
        self.inner.read_value(key).await
    }

    async fn default_value(&self, key: &PreferenceKey) -> AppResult<Option<PreferenceValue>> {
        self.inner.default_value(key).await
    }

    async fn write_value(&self, key: &PreferenceKey, value: &PreferenceValue) -> AppResult<bool> {
        let _guard = self.persist.lock().await;
        let previous = self.inner.current(key);

        let written = self.inner.write_value(key, value).await?;
        if written {
            if let Err(e) = self.save().await {
                warn!(key = %key, error = %e, "Failed to persist setting, rolling back");
                self.inner.replace_current(key, previous);
                return Err(e);
            }
        }
        Ok(written)
    }
}
