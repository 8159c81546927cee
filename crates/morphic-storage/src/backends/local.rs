//! Local filesystem record backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use morphic_core::error::{AppError, ErrorKind};
use morphic_core::result::AppResult;
use morphic_core::traits::RecordBackend;

/// File extension of persisted records.
const RECORD_EXTENSION: &str = "json";

/// Record backend that stores one JSON file per record.
///
/// A key `"preferences/prefs-1"` lives at `<root>/preferences/prefs-1.json`.
/// Writes go to a hidden temporary file that is renamed into place, so a
/// reader never sees a partially written record.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    /// Root directory for all stored records.
    root: PathBuf,
}

impl LocalBackend {
    /// Create a new local backend rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to the file holding its payload.
    fn resolve(&self, key: &str) -> PathBuf {
        let clean = key.trim_start_matches('/');
        self.root.join(format!("{clean}.{RECORD_EXTENSION}"))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordBackend for LocalBackend {
    fn backend_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.exists() && self.root.is_dir())
    }

    async fn read(&self, key: &str) -> AppResult<Option<Bytes>> {
        let full_path = self.resolve(key);
        match fs::read(&full_path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read record: {key}"),
                e,
            )),
        }
    }

    async fn write(&self, key: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(key);
        self.ensure_parent(&full_path).await?;

        let file_name = full_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| AppError::storage(format!("Invalid record key: {key}")))?;
        let temp_path = full_path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        fs::write(&temp_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write record: {key}"),
                e,
            )
        })?;

        if let Err(e) = fs::rename(&temp_path, &full_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to commit record: {key}"),
                e,
            ));
        }

        debug!(key, bytes = data.len(), "Wrote record");
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        let full_path = self.resolve(key);
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete record: {key}"),
                e,
            )),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.contains(key))
    }

    fn contains(&self, key: &str) -> bool {
        self.resolve(key).is_file()
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<String>> {
        let (dir, name_prefix) = prefix.rsplit_once('/').unwrap_or(("", prefix));
        let full_path = self.root.join(dir);
        if !full_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to list records: {prefix}"),
                e,
            )
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let name = entry.file_name().to_string_lossy().to_string();
            // Temporary files are hidden.
            if name.starts_with('.') {
                continue;
            }
            let Some(stem) = name.strip_suffix(&format!(".{RECORD_EXTENSION}")) else {
                continue;
            };
            if !stem.starts_with(name_prefix) {
                continue;
            }
            keys.push(if dir.is_empty() {
                stem.to_string()
            } else {
                format!("{dir}/{stem}")
            });
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_str().unwrap())
            .await
            .unwrap();

        let data = Bytes::from(r#"{"identifier":"prefs-1"}"#);
        backend.write("preferences/prefs-1", data.clone()).await.unwrap();

        assert!(backend.contains("preferences/prefs-1"));
        assert!(dir.path().join("preferences/prefs-1.json").is_file());
        assert_eq!(backend.read("preferences/prefs-1").await.unwrap(), Some(data));

        assert!(backend.delete("preferences/prefs-1").await.unwrap());
        assert!(!backend.exists("preferences/prefs-1").await.unwrap());
        assert!(!backend.delete("preferences/prefs-1").await.unwrap());
        assert_eq!(backend.read("preferences/prefs-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_str().unwrap())
            .await
            .unwrap();

        backend.write("user/u1", Bytes::from("first")).await.unwrap();
        backend.write("user/u1", Bytes::from("second")).await.unwrap();

        assert_eq!(
            backend.read("user/u1").await.unwrap(),
            Some(Bytes::from("second"))
        );
        let files: Vec<_> = std::fs::read_dir(dir.path().join("user"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_list() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_str().unwrap())
            .await
            .unwrap();

        backend.write("user/b", Bytes::from("b")).await.unwrap();
        backend.write("user/a", Bytes::from("a")).await.unwrap();
        backend
            .write("preferences/a", Bytes::from("c"))
            .await
            .unwrap();

        let keys = backend.list("user/").await.unwrap();
        assert_eq!(keys, vec!["user/a".to_string(), "user/b".to_string()]);
        assert!(backend.list("missing/").await.unwrap().is_empty());
    }
}
