//! Record storage configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local backend type: `"local"` (filesystem) or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Root directory for locally persisted records.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// Read cache placed in front of the backends.
    #[serde(default)]
    pub cache: StorageCacheConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            data_root: default_data_root(),
            cache: StorageCacheConfig::default(),
        }
    }
}

/// In-memory read cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageCacheConfig {
    /// Maximum number of cached records.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// TTL for cached records in seconds. `0` disables the cache.
    #[serde(default = "default_ttl")]
    pub time_to_live_seconds: u64,
}

impl Default for StorageCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            time_to_live_seconds: default_ttl(),
        }
    }
}

impl StorageCacheConfig {
    /// Whether the read cache should be built at all.
    pub fn is_enabled(&self) -> bool {
        self.time_to_live_seconds > 0 && self.max_capacity > 0
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_data_root() -> String {
    "./data/morphic".to_string()
}

fn default_max_capacity() -> u64 {
    1000
}

fn default_ttl() -> u64 {
    300
}
