use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage, for development and single-host deployments
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for stored artifacts (e.g., "/var/lib/ktform")
    /// * `base_url` - Base URL the directory is served from (e.g., "http://localhost:8080/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path, rejecting anything that could escape
    /// the base directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.contains('\\')
            || storage_key.starts_with('/')
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);
        if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write(&self, key: &str, data: &[u8]) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(self.generate_url(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> StorageResult<String> {
        self.write(storage_key, &data).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::storage_key_at;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:8080/files/".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn upload_writes_under_the_key_and_returns_its_url() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let key = storage_key_at(1719567000000, "handover notes.txt");

        let url = storage
            .upload_with_key(&key, Bytes::from_static(b"test data"), "text/plain")
            .await
            .unwrap();

        assert_eq!(key, "kt-forms/1719567000000-handover notes.txt");
        assert_eq!(url, format!("http://localhost:8080/files/{}", key));
        assert_eq!(std::fs::read(dir.path().join(&key)).unwrap(), b"test data");
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }

    #[tokio::test]
    async fn hostile_filenames_stay_inside_the_base_dir() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let key = storage_key_at(1, "../../escape.txt");

        storage
            .upload_with_key(&key, Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap();
        assert!(!key.contains(".."));
        assert!(dir.path().join(&key).exists());
    }

    #[tokio::test]
    async fn path_traversal_keys_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        for key in ["../../../etc/passwd", "kt-forms\\x", "/etc/passwd", ""] {
            let result = storage
                .upload_with_key(key, Bytes::from_static(b"x"), "text/plain")
                .await;
            assert!(matches!(result, Err(StorageError::InvalidKey(_))), "{key}");
        }
    }

    #[tokio::test]
    async fn rewriting_a_key_replaces_the_content() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let key = storage_key_at(2, "a.txt");

        for body in [&b"first"[..], &b"second"[..]] {
            storage
                .upload_with_key(&key, Bytes::copy_from_slice(body), "text/plain")
                .await
                .unwrap();
        }
        assert_eq!(std::fs::read(dir.path().join(&key)).unwrap(), b"second");
    }
}
