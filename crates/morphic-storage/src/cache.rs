//! Read cache in front of the record backends, using moka.

use std::time::Duration;

use bytes::Bytes;
use moka::future::Cache;
use tracing::debug;

use morphic_core::config::StorageCacheConfig;

/// Cache of serialized record payloads keyed by storage key.
#[derive(Debug, Clone)]
pub struct RecordCache {
    cache: Cache<String, Bytes>,
}

impl RecordCache {
    /// Build a cache from configuration.
    pub fn new(config: &StorageCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.time_to_live_seconds))
            .build();
        Self { cache }
    }

    /// Build a cache only when configuration enables it.
    pub fn from_config(config: &StorageCacheConfig) -> Option<Self> {
        config.is_enabled().then(|| Self::new(config))
    }

    /// Cached payload for `key`.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let hit = self.cache.get(key).await;
        if hit.is_some() {
            debug!(key, "Record cache hit");
        }
        hit
    }

    /// Store the payload for `key`.
    pub async fn insert(&self, key: &str, data: Bytes) {
        self.cache.insert(key.to_string(), data).await;
    }

    /// Drop the payload for `key`.
    pub async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
    }
}
