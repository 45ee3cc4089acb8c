//! Filesystem photo store backing the `/images` route.
//!
//! Files live under `<images_path>/<user_id>/<uuid>.<ext>` and are exposed as
//! `/images/<user_id>/<file>`. Multi-photo form submissions go through
//! [`UploadBatch`], which tracks written files so a later failure can remove
//! them again instead of leaving orphans behind.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::constants::fotos;

#[derive(Debug, Error)]
pub enum PhotoStoreError {
    #[error("Unsupported photo type: {0}")]
    UnsupportedType(String),

    #[error("Not a managed photo URL: {0}")]
    ForeignUrl(String),

    #[error("Failed to remove photo {url}: {source}")]
    RemoveFailed {
        url: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct PhotoStore {
    root: PathBuf,
}

impl PhotoStore {
    pub fn new(images_path: impl Into<PathBuf>) -> Self {
        Self {
            root: images_path.into(),
        }
    }

    /// Write one photo and return its public URL.
    pub async fn save(
        &self,
        user_id: i32,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, PhotoStoreError> {
        let ext = extension_for(file_name, content_type)?;
        let stored_name = format!("{}.{ext}", uuid::Uuid::new_v4());

        let dir = self.root.join(user_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&stored_name), bytes).await?;

        Ok(format!("/images/{user_id}/{stored_name}"))
    }

    /// Map a public URL back to its path on disk. Rejects URLs outside the
    /// managed prefix and anything attempting path traversal.
    pub fn disk_path(&self, url: &str) -> Result<PathBuf, PhotoStoreError> {
        let rel = url
            .strip_prefix("/images/")
            .ok_or_else(|| PhotoStoreError::ForeignUrl(url.to_string()))?;

        if rel.split('/').any(|seg| seg.is_empty() || seg == "..") {
            return Err(PhotoStoreError::ForeignUrl(url.to_string()));
        }

        Ok(self.root.join(rel))
    }

    /// Remove a stored photo. A file that is already gone counts as removed.
    pub async fn remove(&self, url: &str) -> Result<(), PhotoStoreError> {
        let path = self.disk_path(url)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PhotoStoreError::RemoveFailed {
                url: url.to_string(),
                source,
            }),
        }
    }

    /// Remove every URL, stopping at the first failure so a record delete
    /// can abort instead of losing track of remaining blobs.
    pub async fn remove_all(&self, urls: &[String]) -> Result<(), PhotoStoreError> {
        for url in urls {
            self.remove(url).await?;
        }
        Ok(())
    }
}

/// Staged multi-file upload: written files are tracked until [`commit`];
/// dropping the batch through [`rollback`] removes everything written so far.
///
/// [`commit`]: UploadBatch::commit
/// [`rollback`]: UploadBatch::rollback
pub struct UploadBatch<'a> {
    store: &'a PhotoStore,
    saved: Vec<String>,
}

impl<'a> UploadBatch<'a> {
    pub const fn new(store: &'a PhotoStore) -> Self {
        Self {
            store,
            saved: Vec::new(),
        }
    }

    pub async fn save(
        &mut self,
        user_id: i32,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, PhotoStoreError> {
        let url = self.store.save(user_id, file_name, content_type, bytes).await?;
        self.saved.push(url.clone());
        Ok(url)
    }

    /// Best-effort removal of everything written by this batch.
    pub async fn rollback(self) {
        for url in &self.saved {
            if let Err(e) = self.store.remove(url).await {
                warn!("Failed to roll back uploaded photo {url}: {e}");
            }
        }
        if !self.saved.is_empty() {
            info!("Rolled back {} staged photo upload(s)", self.saved.len());
        }
    }

    pub fn commit(mut self) -> Vec<String> {
        std::mem::take(&mut self.saved)
    }
}

fn extension_for(file_name: &str, content_type: Option<&str>) -> Result<String, PhotoStoreError> {
    if let Some(ext) = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        && fotos::ALLOWED_EXTENSIONS.contains(&ext.as_str())
    {
        return Ok(ext);
    }

    if let Some(ct) = content_type
        && let Some(exts) = mime_guess::get_mime_extensions_str(ct)
        && let Some(ext) = exts
            .iter()
            .find(|e| fotos::ALLOWED_EXTENSIONS.contains(*e))
    {
        return Ok((*ext).to_string());
    }

    Err(PhotoStoreError::UnsupportedType(file_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(dir.path());

        let url = store
            .save(7, "rocky.jpg", Some("image/jpeg"), b"not really a jpeg")
            .await
            .unwrap();
        assert!(url.starts_with("/images/7/"));
        assert!(url.ends_with(".jpg"));

        let path = store.disk_path(&url).unwrap();
        assert!(path.exists());

        store.remove(&url).await.unwrap();
        assert!(!path.exists());

        // removing again is not an error
        store.remove(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(dir.path());

        let err = store.save(1, "virus.exe", None, b"nope").await.unwrap_err();
        assert!(matches!(err, PhotoStoreError::UnsupportedType(_)));
    }

    #[tokio::test]
    async fn test_disk_path_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(dir.path());

        assert!(store.disk_path("/images/1/../../etc/passwd").is_err());
        assert!(store.disk_path("/elsewhere/1/a.jpg").is_err());
    }

    #[tokio::test]
    async fn test_batch_rollback_removes_written_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(dir.path());

        let mut batch = UploadBatch::new(&store);
        let a = batch.save(3, "a.png", None, b"a").await.unwrap();
        let b = batch.save(3, "b.png", None, b"b").await.unwrap();

        let path_a = store.disk_path(&a).unwrap();
        let path_b = store.disk_path(&b).unwrap();
        assert!(path_a.exists() && path_b.exists());

        batch.rollback().await;
        assert!(!path_a.exists() && !path_b.exists());
    }
}
