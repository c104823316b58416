//! Storage backends.

pub mod filesystem;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;

/// Result of a presigned URL request
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL for direct access
    pub url: String,
    /// When the URL expires
    pub expires_in: Duration,
}

/// Storage backend trait
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store content under the given key
    async fn put(&self, key: &str, content: Bytes) -> Result<()>;

    /// Retrieve content by key
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Check if key exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Delete content by key
    async fn delete(&self, key: &str) -> Result<()>;

    /// List all keys under a prefix
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Check if this backend supports redirect downloads via presigned URLs
    fn supports_redirect(&self) -> bool {
        false
    }

    /// Get a presigned URL for direct download (if supported)
    ///
    /// Returns `Ok(Some(url))` if presigned URLs are supported,
    /// `Ok(None)` if not supported, or an error if generation fails.
    async fn get_presigned_url(&self, key: &str, expires_in: Duration) -> Result<Option<PresignedUrl>> {
        let _ = (key, expires_in);
        Ok(None)
    }
}

/// Build the storage backend selected by the configuration.
pub async fn from_config(config: &Config) -> Result<Arc<dyn StorageBackend>> {
    match config.storage_backend.as_str() {
        "s3" => Ok(Arc::new(s3::S3Backend::from_env().await?)),
        _ => Ok(Arc::new(filesystem::FilesystemStorage::new(
            &config.storage_path,
        ))),
    }
}
