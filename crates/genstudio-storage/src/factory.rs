#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-supabase")]
use crate::SupabaseStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use genstudio_core::Config;
use std::sync::Arc;

/// The configured backend.
pub struct ConfiguredStorage {
    pub storage: Arc<dyn Storage>,
    /// Set when the local backend is active; the API serves its signed URLs itself.
    #[cfg(feature = "storage-local")]
    pub local: Option<Arc<LocalStorage>>,
}

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<ConfiguredStorage> {
    match config.storage_backend {
        #[cfg(feature = "storage-supabase")]
        StorageBackend::Supabase => {
            let url = config.supabase_url.clone().ok_or_else(|| {
                StorageError::ConfigError("SUPABASE_URL not configured".to_string())
            })?;
            let key = config.supabase_service_role_key.clone().ok_or_else(|| {
                StorageError::ConfigError("SUPABASE_SERVICE_ROLE_KEY not configured".to_string())
            })?;

            Ok(ConfiguredStorage {
                storage: Arc::new(SupabaseStorage::new(url, key)?),
                #[cfg(feature = "storage-local")]
                local: None,
            })
        }

        #[cfg(not(feature = "storage-supabase"))]
        StorageBackend::Supabase => Err(StorageError::ConfigError(
            "Supabase storage backend not available (storage-supabase feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;
            let secret = config.local_storage_signing_secret.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_SIGNING_SECRET not configured".to_string())
            })?;

            let local = Arc::new(LocalStorage::new(base_path, base_url, secret).await?);
            Ok(ConfiguredStorage {
                storage: local.clone(),
                local: Some(local),
            })
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local", feature = "storage-supabase"))]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(extra: &[(&str, String)]) -> Config {
        let mut env: HashMap<String, String> = [
            ("DATABASE_URL", "postgres://localhost/genstudio"),
            ("REPLICATE_API_TOKEN", "r8_token"),
            ("RUNWAY_API_KEY", "key_runway"),
            ("CLERK_JWKS_URL", "https://clerk.example.com/.well-known/jwks.json"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (key, value) in extra {
            env.insert(key.to_string(), value.clone());
        }
        Config::from_lookup(|key| env.get(key).cloned()).unwrap()
    }

    #[tokio::test]
    async fn local_backend_exposes_concrete_handle() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&[
            ("STORAGE_BACKEND", "local".to_string()),
            ("LOCAL_STORAGE_PATH", dir.path().to_string_lossy().into_owned()),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:4000".to_string()),
            ("LOCAL_STORAGE_SIGNING_SECRET", "0123456789abcdef0123456789abcdef".to_string()),
        ]);

        let configured = create_storage(&config).await.unwrap();
        assert_eq!(configured.storage.backend_type(), StorageBackend::Local);
        assert!(configured.local.is_some());
    }

    #[tokio::test]
    async fn supabase_backend_has_no_local_handle() {
        let config = config(&[
            ("SUPABASE_URL", "https://project.supabase.co".to_string()),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-role-key".to_string()),
        ]);

        let configured = create_storage(&config).await.unwrap();
        assert_eq!(configured.storage.backend_type(), StorageBackend::Supabase);
        assert!(configured.local.is_none());
    }

    #[tokio::test]
    async fn local_backend_requires_signing_secret() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&[
            ("STORAGE_BACKEND", "local".to_string()),
            ("LOCAL_STORAGE_PATH", dir.path().to_string_lossy().into_owned()),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:4000".to_string()),
        ]);

        let err = create_storage(&config).await.err().unwrap();
        assert!(matches!(err, StorageError::ConfigError(msg) if msg.contains("SIGNING_SECRET")));
    }
}
