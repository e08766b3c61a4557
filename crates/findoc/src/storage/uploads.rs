//! Uploaded document storage
//!
//! Files are addressed by a freshly generated UUID, never by the client's
//! filename, so concurrent uploads cannot overwrite each other.

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Extension given to every stored upload
pub const UPLOAD_EXTENSION: &str = "pdf";

/// Directory-backed store for uploaded documents
#[derive(Debug, Clone)]
pub struct UploadStore {
    data_dir: PathBuf,
}

impl UploadStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Persist an upload, returning its storage path
    pub async fn save(&self, data: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.data_dir).await.map_err(|e| {
            Error::Storage(format!(
                "Failed to create data directory {}: {}",
                self.data_dir.display(),
                e
            ))
        })?;

        let path = self
            .data_dir
            .join(format!("{}.{}", Uuid::new_v4(), UPLOAD_EXTENSION));

        tokio::fs::write(&path, data).await.map_err(|e| {
            Error::Storage(format!("Failed to write {}: {}", path.display(), e))
        })?;

        tracing::debug!("Stored upload at {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }

    /// Delete a stored upload
    pub async fn remove(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_uses_unique_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let first = store.save(b"%PDF-1.4 first").await.unwrap();
        let second = store.save(b"%PDF-1.4 first").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first.extension().and_then(|e| e.to_str()), Some("pdf"));
        assert!(first.starts_with(store.data_dir()));
        assert_eq!(tokio::fs::read(&first).await.unwrap(), b"%PDF-1.4 first");
    }

    #[tokio::test]
    async fn test_save_into_unwritable_location_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        tokio::fs::write(&blocker, b"file").await.unwrap();

        let store = UploadStore::new(blocker.join("uploads"));
        let err = store.save(b"data").await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let path = store.save(b"data").await.unwrap();

        store.remove(&path).await.unwrap();
        assert!(!path.exists());
    }
}
