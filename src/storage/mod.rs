//! Object storage
//!
//! The media library lives in one bucket. Objects are written with
//! `upload(path, bytes)` and served from `public_url(path)`. The local
//! backend keeps each bucket as a directory under the storage root, which
//! the HTTP layer serves under the configured public prefix.

use crate::config::StorageConfig;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    fn bucket(&self) -> &str;

    /// Store `bytes` at `path` inside the bucket, replacing any object there
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError>;

    fn public_url(&self, path: &str) -> String;
}

pub type DynObjectStorage = Arc<dyn ObjectStorage>;

/// Bucket stored on the local filesystem at `{root}/{bucket}`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    bucket: String,
    dir: PathBuf,
    public_base: String,
}

impl LocalStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            bucket: config.bucket.clone(),
            dir: config.path.join(&config.bucket),
            public_base: format!(
                "{}/{}",
                config.public_url.trim_end_matches('/'),
                config.bucket
            ),
        }
    }

    pub fn boxed(config: &StorageConfig) -> DynObjectStorage {
        Arc::new(Self::new(config))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Only plain relative paths are allowed inside a bucket
fn check_object_path(path: &str) -> Result<&Path, StorageError> {
    let candidate = Path::new(path);
    let plain = !path.is_empty()
        && candidate
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(candidate)
    } else {
        Err(StorageError::InvalidPath(path.to_string()))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<(), StorageError> {
        let relative = check_object_path(path)?;
        let target = self.dir.join(relative);
        let io_err = |source| StorageError::Io {
            path: path.to_string(),
            source,
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        fs::write(&target, bytes).await.map_err(io_err)?;
        tracing::debug!("Stored {} bytes at {}/{}", bytes.len(), self.bucket, path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> LocalStorage {
        LocalStorage::new(&StorageConfig {
            path: dir.path().to_path_buf(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_upload_writes_into_bucket() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        storage
            .upload("1700000000000-abc.png", b"png-bytes", "image/png")
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("media-library/1700000000000-abc.png")).unwrap();
        assert_eq!(written, b"png-bytes");
        assert_eq!(
            storage.public_url("1700000000000-abc.png"),
            "/uploads/media-library/1700000000000-abc.png"
        );
    }

    #[tokio::test]
    async fn test_nested_path_creates_dirs() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        storage.upload("gallery/a.jpg", b"x", "image/jpeg").await.unwrap();
        assert!(dir.path().join("media-library/gallery/a.jpg").exists());
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        for bad in ["../evil.png", "/etc/passwd", "", "a/../../b"] {
            let err = storage.upload(bad, b"x", "image/png").await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidPath(_)), "{bad}");
        }
    }
}
