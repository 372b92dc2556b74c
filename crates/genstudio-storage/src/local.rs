use crate::token;
use crate::traits::{validate_key, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Route prefix under which the API serves local objects.
pub const LOCAL_FILES_ROUTE: &str = "/storage/local";

/// Local filesystem storage implementation
///
/// Objects live at `{base_path}/{bucket}/{path}`. Signed URLs point at the API's
/// `/storage/local/{bucket}/{path}?token=...` route, which checks the HMAC token.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signing_secret: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/genstudio/storage")
    /// * `base_url` - Public base URL of the API (e.g., "http://localhost:4000")
    /// * `signing_secret` - HMAC key for signed URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
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
            base_url: base_url.trim_end_matches('/').to_string(),
            signing_secret: signing_secret.into(),
        })
    }

    /// Check a token issued by `create_signed_url`.
    pub fn verify_token(&self, bucket: &str, path: &str, token: &str) -> Result<(), token::TokenError> {
        token::verify(token, bucket, path, &self.signing_secret)
    }

    /// Convert bucket and key to a filesystem path with traversal checks
    fn key_to_path(&self, bucket: &str, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        if bucket.is_empty() || bucket.contains('/') || bucket == ".." {
            return Err(StorageError::InvalidKey(format!("Invalid bucket: {}", bucket)));
        }

        let bucket_root = self.base_path.join(bucket);
        let path = bucket_root.join(storage_key);

        if let (Ok(base), Ok(canonical)) = (self.base_path.canonicalize(), path.canonicalize()) {
            if canonical.strip_prefix(&base).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Read an object for the signed-URL file route.
    pub async fn download(&self, bucket: &str, path: &str) -> StorageResult<Bytes> {
        let file_path = self.key_to_path(bucket, path)?;

        if !fs::try_exists(&file_path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, path)));
        }

        let data = fs::read(&file_path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", file_path.display(), e))
        })?;

        tracing::debug!(bucket = %bucket, key = %path, size_bytes = data.len(), "Local storage download");

        Ok(Bytes::from(data))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(bucket, path)?;
        let token = token::create(bucket, path, expires_in, &self.signing_secret)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;

        let encoded_path = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        Ok(format!(
            "{}{}/{}/{}?token={}",
            self.base_url, LOCAL_FILES_ROUTE, bucket, encoded_path, token
        ))
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        _content_type: &str,
        data: Bytes,
    ) -> StorageResult<()> {
        let file_path = self.key_to_path(bucket, path)?;
        let size = data.len();
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&file_path).await?;

        let mut file = fs::File::create(&file_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", file_path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", file_path.display(), e))
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn delete(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        for path in paths {
            let file_path = self.key_to_path(bucket, path)?;
            if !fs::try_exists(&file_path).await.unwrap_or(false) {
                continue;
            }
            fs::remove_file(&file_path).await.map_err(|e| {
                StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    file_path.display(),
                    e
                ))
            })?;
            tracing::info!(bucket = %bucket, key = %path, "Local storage delete successful");
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:4000/".to_string(), SECRET)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_download_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .upload("user-uploads", "u1/p1/a.png", "image/png", Bytes::from_static(b"png"))
            .await
            .unwrap();

        let data = storage.download("user-uploads", "u1/p1/a.png").await.unwrap();
        assert_eq!(&data[..], b"png");
        assert!(dir.path().join("user-uploads/u1/p1/a.png").exists());
    }

    #[tokio::test]
    async fn test_signed_url_carries_verifiable_token() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let url = storage
            .create_signed_url("user-uploads", "u1/p1/my file.png", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:4000/storage/local/user-uploads/u1/p1/my%20file.png?token="));
        let token = url.split("token=").nth(1).unwrap();
        assert!(storage.verify_token("user-uploads", "u1/p1/my file.png", token).is_ok());
        assert!(storage.verify_token("user-uploads", "u1/p1/other.png", token).is_err());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.download("user-uploads", "../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("user-uploads", &["/etc/passwd".to_string()]).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage
            .create_signed_url("../secrets", "a/b/c", Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .upload("b", "u/p/x.mp4", "video/mp4", Bytes::from_static(b"mp4"))
            .await
            .unwrap();
        storage
            .delete("b", &["u/p/x.mp4".to_string(), "u/p/missing.mp4".to_string()])
            .await
            .unwrap();

        let result = storage.download("b", "u/p/x.mp4").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_batch_signing_uses_default_impl() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let results = storage
            .create_signed_urls(
                "b",
                &["u/p/ok.png".to_string(), "../bad".to_string()],
                Duration::from_secs(30),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].signed_url.is_some());
        assert!(results[1].signed_url.is_none());
        assert!(results[1].error.is_some());
    }
}
