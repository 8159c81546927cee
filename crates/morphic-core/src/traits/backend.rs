//! Backend trait for pluggable keyed record persistence.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Byte-level keyed persistence used by the typed storage layer.
///
/// Keys have the form `"<kind>/<identifier>"`. Implementations exist for
/// process memory, the local filesystem, and the remote preferences server.
/// Serialization of concurrent operations on the same key is the caller's
/// responsibility.
#[async_trait]
pub trait RecordBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend type name (e.g. `"local"`, `"remote"`).
    fn backend_type(&self) -> &str;

    /// Check whether the backend is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Read the payload stored under `key`. `Ok(None)` when absent.
    async fn read(&self, key: &str) -> AppResult<Option<Bytes>>;

    /// Store `data` under `key`, replacing any previous payload.
    async fn write(&self, key: &str, data: Bytes) -> AppResult<()>;

    /// Delete the payload under `key`. Returns whether anything was deleted.
    async fn delete(&self, key: &str) -> AppResult<bool>;

    /// Check whether a payload exists under `key`.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Synchronous existence check against locally held state.
    ///
    /// Backends without local state return `false`.
    fn contains(&self, key: &str) -> bool;

    /// List all keys starting with `prefix`.
    async fn list(&self, prefix: &str) -> AppResult<Vec<String>>;
}
