//! Runway image-to-video client
//!
//! API reference: https://docs.dev.runwayml.com/api

use crate::error::ProviderError;
use crate::http::{build_client, ensure_success, job_id_segment, read_json, trim_base_url};
use crate::poller::JobStatusSource;
use crate::status::{output_urls, JobSnapshot, JobStatus};
use async_trait::async_trait;
use genstudio_core::models::GenerateVideoRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Debug, Formatter, Result as FmtResult};

pub const RUNWAY_API_BASE: &str = "https://api.dev.runwayml.com/v1";
pub const RUNWAY_API_VERSION: &str = "2024-11-06";
const RUNWAY_VERSION_HEADER: &str = "X-Runway-Version";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageToVideoBody<'a> {
    prompt_image: &'a str,
    model: &'a str,
    ratio: &'a str,
    duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResponse {
    id: String,
    status: String,
    progress: Option<f64>,
    output: Option<Value>,
    failure: Option<String>,
    failure_code: Option<String>,
}

/// Runway API client
#[derive(Clone)]
pub struct RunwayClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Debug for RunwayClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RunwayClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RunwayClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http_client: build_client()?,
            base_url: RUNWAY_API_BASE.to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header(RUNWAY_VERSION_HEADER, RUNWAY_API_VERSION)
    }

    /// Start an image-to-video task and return its id.
    ///
    /// `prompt_image` must already be a URL or data URI; storage paths are signed by the caller.
    #[tracing::instrument(skip(self, request), fields(model = tracing::field::Empty, ratio = tracing::field::Empty))]
    pub async fn image_to_video(&self, request: &GenerateVideoRequest) -> Result<String, ProviderError> {
        let prompt_image = request
            .prompt_image
            .as_deref()
            .ok_or_else(|| ProviderError::InvalidRequest("prompt_image is required".to_string()))?;
        let ratio = request
            .ratio
            .as_deref()
            .ok_or_else(|| ProviderError::InvalidRequest("ratio is required".to_string()))?;
        let model = request.resolved_model();

        tracing::Span::current().record("model", model.as_str());
        tracing::Span::current().record("ratio", ratio);

        let body = ImageToVideoBody {
            prompt_image,
            model: model.as_str(),
            ratio,
            duration: request.resolved_duration(),
            prompt_text: request.prompt_text.as_deref().filter(|t| !t.trim().is_empty()),
            seed: request.seed,
        };

        let response = self
            .authorized(self.http_client.post(format!("{}/image_to_video", self.base_url)))
            .json(&body)
            .send()
            .await?;

        let created: CreateTaskResponse = serde_json::from_value(read_json(response).await?)
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        tracing::info!(task_id = %created.id, "Runway task created");
        Ok(created.id)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_task(&self, task_id: &str) -> Result<JobSnapshot, ProviderError> {
        let response = self
            .authorized(
                self.http_client
                    .get(format!("{}/tasks/{}", self.base_url, job_id_segment(task_id)?)),
            )
            .send()
            .await?;

        snapshot_from_value(read_json(response).await?)
    }

    /// Cancel a running task, or delete a finished one.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_task(&self, task_id: &str) -> Result<(), ProviderError> {
        let response = self
            .authorized(
                self.http_client
                    .delete(format!("{}/tasks/{}", self.base_url, job_id_segment(task_id)?)),
            )
            .send()
            .await?;

        ensure_success(response).await?;
        tracing::info!(task_id = %task_id, "Runway task canceled");
        Ok(())
    }

    /// Fetch a generated video (output URLs are short-lived).
    pub async fn download_output(&self, url: &str) -> Result<bytes::Bytes, ProviderError> {
        let response = self.http_client.get(url).send().await?;
        Ok(ensure_success(response).await?.bytes().await?)
    }
}

#[async_trait]
impl JobStatusSource for RunwayClient {
    async fn fetch_status(&self, job_id: &str) -> Result<JobSnapshot, ProviderError> {
        self.get_task(job_id).await
    }
}

fn map_status(task_id: &str, status: &str) -> JobStatus {
    match status {
        "PENDING" | "THROTTLED" => JobStatus::Pending,
        "RUNNING" => JobStatus::Processing,
        "SUCCEEDED" => JobStatus::Succeeded,
        "FAILED" => JobStatus::Failed,
        "CANCELLED" | "CANCELED" => JobStatus::Canceled,
        other => {
            tracing::warn!(task_id = %task_id, status = %other, "Unknown task status");
            JobStatus::Processing
        }
    }
}

fn snapshot_from_value(raw: Value) -> Result<JobSnapshot, ProviderError> {
    let task: TaskResponse =
        serde_json::from_value(raw.clone()).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let status = map_status(&task.id, &task.status);
    let progress = match status {
        JobStatus::Succeeded => Some(100.0),
        _ => task.progress.map(|p| (p * 100.0).clamp(0.0, 100.0)),
    };
    let error = task
        .failure
        .filter(|f| !f.trim().is_empty())
        .or(task.failure_code);

    Ok(JobSnapshot {
        id: task.id,
        status,
        progress,
        output: output_urls(task.output.as_ref()),
        error,
        raw,
    })
}
