//! Typed record storage with per-identifier serialization.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use morphic_core::config::AppConfig;
use morphic_core::error::AppError;
use morphic_core::result::AppResult;
use morphic_core::traits::{Record, RecordBackend};
use morphic_core::types::validate_identifier;

use crate::backends::MemoryBackend;
use crate::cache::RecordCache;
use crate::keys;
use crate::manager::BackendManager;

/// Outcome of a load or remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// The record was found (or synthesized, for the default record).
    Success,
    /// No record is stored under the identifier.
    NotFound,
    /// An I/O or decoding fault occurred.
    Failure,
}

impl LoadStatus {
    /// Whether this is [`LoadStatus::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::NotFound => write!(f, "not_found"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Per-key lock table.
type LockTable = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Typed record store over a local backend and an optional remote backend.
///
/// Saves and removes of the same identifier are serialized through a
/// per-key async mutex; the last completed save wins. Loads of the same
/// identifier also take the lock so they never observe a write in flight
/// through the remote write-through path.
#[derive(Debug, Clone)]
pub struct Storage {
    local: BackendManager,
    remote: Option<BackendManager>,
    cache: Option<RecordCache>,
    locks: LockTable,
}

impl Storage {
    /// Create storage over a local backend, without cache or remote sync.
    pub fn new(local: BackendManager) -> Self {
        Self {
            local,
            remote: None,
            cache: None,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Storage that keeps everything in process memory.
    pub fn in_memory() -> Self {
        Self::new(BackendManager::from_backend(Arc::new(MemoryBackend::new())))
    }

    /// Mirror every change to a remote backend.
    pub fn with_remote(mut self, remote: BackendManager) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Put a read cache in front of the backends.
    pub fn with_cache(mut self, cache: RecordCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build storage from the application configuration.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let mut storage = Self::new(BackendManager::new(&config.storage).await?);
        if let Some(cache) = RecordCache::from_config(&config.storage.cache) {
            storage = storage.with_cache(cache);
        }
        if let Some(remote) = BackendManager::remote(&config.remote)? {
            storage = storage.with_remote(remote);
        }
        info!(
            local = storage.local.backend_type(),
            remote = storage.remote.is_some(),
            cache = storage.cache.is_some(),
            "Record storage ready"
        );
        Ok(storage)
    }

    /// The local backend.
    pub fn local(&self) -> &BackendManager {
        &self.local
    }

    /// Persist `record` under its identifier, overwriting any previous version.
    ///
    /// Returns `true` once the local write has completed. A failed remote
    /// push is logged and does not change the result.
    pub async fn save<T: Record>(&self, record: &T) -> bool {
        let identifier = record.identifier();
        match self.try_save(record, &identifier).await {
            Ok(()) => true,
            Err(e) => {
                error!(kind = T::KIND, identifier = %identifier, error = %e, "Failed to save record");
                false
            }
        }
    }

    async fn try_save<T: Record>(&self, record: &T, identifier: &str) -> AppResult<()> {
        validate_identifier(identifier)?;
        record.validate()?;
        let data = Bytes::from(serde_json::to_vec(record)?);
        let key = keys::record(T::KIND, identifier);

        let written = {
            let lock = self.lock_for(&key);
            let _guard = lock.lock().await;
            self.write(&key, data).await
        };
        self.release_lock(&key);
        written
    }

    /// Write `data` locally, refresh the cache, then push to the remote.
    async fn write(&self, key: &str, data: Bytes) -> AppResult<()> {
        self.local.write(key, data.clone()).await?;
        if let Some(cache) = &self.cache {
            cache.insert(key, data.clone()).await;
        }
        debug!(key, "Saved record");

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.write(key, data).await {
                warn!(key, error = %e, "Failed to push record to remote");
            }
        }
        Ok(())
    }

    /// Load the record stored under `identifier`.
    ///
    /// Records with a fallback (the default preferences record) are
    /// synthesized instead of reported as [`LoadStatus::NotFound`]. A remote
    /// read error on a local miss is a [`LoadStatus::Failure`], never a miss.
    pub async fn load<T: Record>(&self, identifier: &str) -> (LoadStatus, Option<T>) {
        if let Err(e) = validate_identifier(identifier) {
            warn!(kind = T::KIND, identifier, error = %e, "Rejected record identifier");
            return (LoadStatus::Failure, None);
        }
        let key = keys::record(T::KIND, identifier);

        let fetched = {
            let lock = self.lock_for(&key);
            let _guard = lock.lock().await;
            self.fetch(&key).await
        };
        self.release_lock(&key);

        match fetched {
            Ok(Some(data)) => match decode::<T>(&data) {
                Ok(record) => (LoadStatus::Success, Some(record)),
                Err(e) => {
                    error!(key = %key, error = %e, "Stored record is corrupt");
                    (LoadStatus::Failure, None)
                }
            },
            Ok(None) => match T::fallback(identifier) {
                Some(record) => {
                    debug!(key = %key, "Synthesized fallback record");
                    (LoadStatus::Success, Some(record))
                }
                None => (LoadStatus::NotFound, None),
            },
            Err(e) => {
                error!(key = %key, error = %e, "Failed to load record");
                (LoadStatus::Failure, None)
            }
        }
    }

    /// Read the raw payload for `key`: cache, then local, then remote.
    async fn fetch(&self, key: &str) -> AppResult<Option<Bytes>> {
        if let Some(cache) = &self.cache {
            if let Some(data) = cache.get(key).await {
                return Ok(Some(data));
            }
        }

        let mut found = self.local.read(key).await?;

        if found.is_none() {
            if let Some(remote) = &self.remote {
                match remote.read(key).await {
                    Ok(Some(data)) => {
                        debug!(key, "Record fetched from remote, writing through");
                        if let Err(e) = self.local.write(key, data.clone()).await {
                            warn!(key, error = %e, "Failed to write remote record locally");
                        }
                        found = Some(data);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(key, error = %e, "Remote read failed");
                        return Err(e);
                    }
                }
            }
        }

        if let (Some(cache), Some(data)) = (&self.cache, &found) {
            cache.insert(key, data.clone()).await;
        }
        Ok(found)
    }

    /// Delete the persisted copy of `record`.
    ///
    /// Returns the last stored state with [`LoadStatus::Success`] when
    /// something was removed, or [`LoadStatus::NotFound`] when nothing was
    /// stored under the identifier.
    pub async fn remove<T: Record>(&self, record: &T) -> (LoadStatus, Option<T>) {
        let identifier = record.identifier();
        if let Err(e) = validate_identifier(&identifier) {
            warn!(kind = T::KIND, identifier = %identifier, error = %e, "Rejected record identifier");
            return (LoadStatus::Failure, None);
        }
        let key = keys::record(T::KIND, &identifier);

        let result = {
            let lock = self.lock_for(&key);
            let _guard = lock.lock().await;
            self.delete(&key).await
        };
        self.release_lock(&key);

        match result {
            Ok((true, Some(data))) => match decode::<T>(&data) {
                Ok(previous) => (LoadStatus::Success, Some(previous)),
                Err(e) => {
                    warn!(key = %key, error = %e, "Removed record was corrupt");
                    (LoadStatus::Success, Some(record.clone()))
                }
            },
            Ok((true, None)) => (LoadStatus::Success, Some(record.clone())),
            Ok((false, _)) => {
                debug!(key = %key, "Nothing to remove");
                (LoadStatus::NotFound, None)
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to remove record");
                (LoadStatus::Failure, None)
            }
        }
    }

    /// Delete `key` everywhere. Returns whether anything was deleted and
    /// the last locally stored payload.
    ///
    /// The remote copy goes first: when it cannot be deleted the local copy
    /// is kept, so a later load cannot resurrect the record from the remote.
    async fn delete(&self, key: &str) -> AppResult<(bool, Option<Bytes>)> {
        let previous = self.local.read(key).await?;

        let mut deleted = match &self.remote {
            Some(remote) => remote.delete(key).await.inspect_err(|e| {
                warn!(key, error = %e, "Failed to delete record on remote");
            })?,
            None => false,
        };

        deleted |= self.local.delete(key).await?;
        if let Some(cache) = &self.cache {
            cache.invalidate(key).await;
        }
        Ok((deleted, previous))
    }

    /// Whether a record of type `T` is held locally under `identifier`.
    pub fn contains<T: Record>(&self, identifier: &str) -> bool {
        validate_identifier(identifier).is_ok()
            && self.local.contains(&keys::record(T::KIND, identifier))
    }

    /// Identifiers of every locally stored record of type `T`, sorted.
    pub async fn identifiers<T: Record>(&self) -> AppResult<Vec<String>> {
        let keys = self.local.list(&keys::kind_prefix(T::KIND)).await?;
        Ok(keys
            .iter()
            .filter_map(|key| keys::identifier(T::KIND, key))
            .map(str::to_string)
            .collect())
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the lock entry once no operation holds or waits on it.
    fn release_lock(&self, key: &str) {
        self.locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

fn decode<T: Record>(data: &[u8]) -> AppResult<T> {
    let record: T = serde_json::from_slice(data)?;
    record.validate()?;
    Ok(record)
}

/// Convenience for callers that want an error instead of a status.
pub fn require<T>(status: LoadStatus, record: Option<T>, identifier: &str) -> AppResult<T> {
    match (status, record) {
        (LoadStatus::Success, Some(record)) => Ok(record),
        (LoadStatus::NotFound, _) => Err(AppError::not_found(format!(
            "No record stored under '{identifier}'"
        ))),
        _ => Err(AppError::storage(format!(
            "Failed to load record '{identifier}'"
        ))),
    }
}
