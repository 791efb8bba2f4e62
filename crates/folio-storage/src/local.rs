use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

use crate::{StorageError, ThumbnailStore, uri_encode, validate_key};

/// Thumbnails kept as plain files under a directory.
///
/// Each object lives at `{dir}/{owner}/{title}`. The directory is expected
/// to be served by the HTTP layer under `public_url`.
pub struct LocalStore {
    dir: PathBuf,
    public_url: String,
}

impl LocalStore {
    pub async fn new(dir: PathBuf, public_url: &str) -> Result<Self, StorageError> {
        fs::create_dir_all(&dir).await?;
        info!("Thumbnail directory: {}", dir.display());
        Ok(Self {
            dir,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    /// Path to the file for a given key.
    pub fn file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.dir.clone(), |path, seg| path.join(seg)))
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, uri_encode(key, true))
    }
}

#[async_trait]
impl ThumbnailStore for LocalStore {
    async fn put(&self, key: &str, body: Bytes, _content_type: &str) -> Result<String, StorageError> {
        let path = self.file_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &body).await?;
        info!("Stored thumbnail {} ({} bytes)", key, body.len());
        Ok(self.url_for(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.file_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted thumbnail {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Thumbnail {} already gone", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
