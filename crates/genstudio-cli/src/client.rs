//! HTTP client for the genstudio API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use genstudio_providers::{JobSnapshot, JobStatusSource, PollConfig, ProviderError};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Which provider a job id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    Replicate,
    Runway,
}

impl Provider {
    pub fn job_path(&self, id: &str) -> String {
        match self {
            Provider::Replicate => format!("/api/replicate/predictions/{}", id),
            Provider::Runway => format!("/api/runway/jobs/{}", id),
        }
    }

    /// Same cadence and attempt budget the server uses for this provider.
    pub fn poll_config(&self) -> PollConfig {
        match self {
            Provider::Replicate => PollConfig::replicate(),
            Provider::Runway => PollConfig::runway(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Create client from environment: GENSTUDIO_API_URL and GENSTUDIO_TOKEN (a session JWT).
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("GENSTUDIO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let token = std::env::var("GENSTUDIO_TOKEN")
            .context("Missing session token. Set GENSTUDIO_TOKEN")?;
        Self::new(&base_url, token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .context("Failed to send request")?;
        read_json(response).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;
        read_json(response).await
    }

    /// Submit an image edit. Returns the API's job response.
    pub async fn edit_image(&self, body: &Value) -> Result<Value> {
        self.post("/api/replicate/predictions", body).await
    }

    /// Submit an image-to-video task. Returns the API's job response.
    pub async fn generate_video(&self, body: &Value) -> Result<Value> {
        self.post("/api/runway/jobs", body).await
    }

    pub async fn job(&self, provider: Provider, id: &str) -> Result<JobSnapshot> {
        self.get(&provider.job_path(id)).await
    }

    pub async fn sign(&self, paths: &[String], expires_in: Option<u64>) -> Result<Value> {
        let body = serde_json::json!({ "paths": paths, "expires_in": expires_in });
        self.post("/api/signed-urls", &body).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(anyhow::anyhow!(
            "API request failed with status {}: {}",
            status,
            error_text
        ));
    }
    response.json().await.context("Failed to parse response")
}

/// Job status through the genstudio API, so the CLI can drive a `JobPoller`.
pub struct ApiJobSource<'a> {
    client: &'a ApiClient,
    provider: Provider,
}

impl<'a> ApiJobSource<'a> {
    pub fn new(client: &'a ApiClient, provider: Provider) -> Self {
        Self { client, provider }
    }
}

#[async_trait]
impl JobStatusSource for ApiJobSource<'_> {
    async fn fetch_status(&self, job_id: &str) -> Result<JobSnapshot, ProviderError> {
        let response = self
            .client
            .request(reqwest::Method::GET, &self.provider.job_path(job_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: format!("HTTP {}: {}", status.as_u16(), body.trim()),
            });
        }

        response
            .json::<JobSnapshot>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}
