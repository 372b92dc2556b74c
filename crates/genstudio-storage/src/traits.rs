//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// One entry of a batch signing call. `signed_url` is `None` when that path failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrl {
    pub path: String,
    pub signed_url: Option<String>,
    pub error: Option<String>,
}

/// Storage abstraction trait
///
/// Implemented by the Supabase backend (production) and the local filesystem backend
/// (development). Handlers and the resolver only see `Arc<dyn Storage>`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create a time-limited URL granting read access to `path` in `bucket`.
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Sign several paths at once. Per-path failures are reported in the result rather
    /// than failing the whole call.
    async fn create_signed_urls(
        &self,
        bucket: &str,
        paths: &[String],
        expires_in: Duration,
    ) -> StorageResult<Vec<SignedUrl>> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            let entry = match self.create_signed_url(bucket, path, expires_in).await {
                Ok(url) => SignedUrl {
                    path: path.clone(),
                    signed_url: Some(url),
                    error: None,
                },
                Err(e) => SignedUrl {
                    path: path.clone(),
                    signed_url: None,
                    error: Some(e.to_string()),
                },
            };
            results.push(entry);
        }
        Ok(results)
    }

    /// Store `data` at `path`, replacing any existing object.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<()>;

    /// Delete objects. Missing objects are not an error.
    async fn delete(&self, bucket: &str, paths: &[String]) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Reject paths that could escape the bucket.
pub(crate) fn validate_key(path: &str) -> StorageResult<()> {
    if path.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if path.starts_with('/') || path.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
