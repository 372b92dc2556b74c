//! Supabase Storage backend
//!
//! Talks to the Storage REST API with the service-role key:
//! - `POST /storage/v1/object/sign/{bucket}/{path}` for a single signed URL
//! - `POST /storage/v1/object/sign/{bucket}` for batch signing
//! - `POST /storage/v1/object/{bucket}/{path}` (upsert) for uploads
//! - `GET /storage/v1/object/{bucket}/{path}` for downloads
//! - `DELETE /storage/v1/object/{bucket}` for deletes

use crate::traits::{validate_key, SignedUrl, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchSignRequest<'a> {
    expires_in: u64,
    paths: &'a [String],
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

#[derive(Deserialize)]
struct BatchSignEntry {
    path: Option<String>,
    #[serde(rename = "signedURL")]
    signed_url: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    prefixes: &'a [String],
}

/// Supabase Storage client
#[derive(Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseStorage {
    /// `base_url` is the project URL, e.g. `https://xyz.supabase.co`.
    pub fn new(base_url: impl Into<String>, service_role_key: impl Into<String>) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_role_key: service_role_key.into(),
        })
    }

    fn storage_url(&self, suffix: &str) -> String {
        format!("{}/storage/v1{}", self.base_url, suffix)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
    }

    /// Absolute URL for a `signedURL` value, which the API returns relative to `/storage/v1`.
    fn absolute_signed_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            signed.to_string()
        } else if signed.starts_with('/') {
            self.storage_url(signed)
        } else {
            self.storage_url(&format!("/{}", signed))
        }
    }

    async fn error_body(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!(
            "HTTP {}: {} - {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
            body
        )
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl Storage for SupabaseStorage {
    #[tracing::instrument(skip(self), fields(backend = "supabase"))]
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(path)?;
        let url = self.storage_url(&format!("/object/sign/{}/{}", bucket, encode_path(path)));

        let response = self
            .authorized(self.client.post(&url))
            .json(&SignRequest {
                expires_in: expires_in.as_secs(),
            })
            .send()
            .await
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, path)));
        }
        if !response.status().is_success() {
            return Err(StorageError::SigningFailed(Self::error_body(response).await));
        }

        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| StorageError::SigningFailed(format!("Invalid sign response: {}", e)))?;

        Ok(self.absolute_signed_url(&body.signed_url))
    }

    #[tracing::instrument(skip(self, paths), fields(backend = "supabase", count = paths.len()))]
    async fn create_signed_urls(
        &self,
        bucket: &str,
        paths: &[String],
        expires_in: Duration,
    ) -> StorageResult<Vec<SignedUrl>> {
        let mut valid = Vec::with_capacity(paths.len());
        let mut rejected = Vec::new();
        for path in paths {
            match validate_key(path) {
                Ok(()) => valid.push(path.clone()),
                Err(e) => rejected.push(SignedUrl {
                    path: path.clone(),
                    signed_url: None,
                    error: Some(e.to_string()),
                }),
            }
        }
        if valid.is_empty() {
            return Ok(rejected);
        }

        let url = self.storage_url(&format!("/object/sign/{}", bucket));
        let response = self
            .authorized(self.client.post(&url))
            .json(&BatchSignRequest {
                expires_in: expires_in.as_secs(),
                paths: &valid,
            })
            .send()
            .await
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::SigningFailed(Self::error_body(response).await));
        }

        let entries: Vec<BatchSignEntry> = response
            .json()
            .await
            .map_err(|e| StorageError::SigningFailed(format!("Invalid sign response: {}", e)))?;

        // Entries come back in request order; fall back to the position when `path` is absent.
        let mut results: Vec<SignedUrl> = entries
            .into_iter()
            .zip(valid.iter())
            .map(|(entry, requested)| SignedUrl {
                path: entry.path.unwrap_or_else(|| requested.clone()),
                signed_url: entry.signed_url.map(|s| self.absolute_signed_url(&s)),
                error: entry.error,
            })
            .collect();
        results.extend(rejected);

        Ok(results)
    }

    #[tracing::instrument(skip(self, data), fields(backend = "supabase", size_bytes = data.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<()> {
        validate_key(path)?;
        let url = self.storage_url(&format!("/object/{}/{}", bucket, encode_path(path)));
        let start = std::time::Instant::now();

        let response = self
            .authorized(self.client.post(&url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::UploadFailed(Self::error_body(response).await));
        }

        tracing::info!(
            bucket = %bucket,
            key = %path,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Supabase storage upload successful"
        );
        Ok(())
    }

    #[tracing::instrument(skip(self, paths), fields(backend = "supabase", count = paths.len()))]
    async fn delete(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        for path in paths {
            validate_key(path)?;
        }

        let url = self.storage_url(&format!("/object/{}", bucket));
        let response = self
            .authorized(self.client.delete(&url))
            .json(&DeleteRequest { prefixes: paths })
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::DeleteFailed(Self::error_body(response).await));
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}
