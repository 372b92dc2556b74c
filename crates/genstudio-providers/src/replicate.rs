//! Replicate predictions client
//!
//! Model: https://replicate.com/black-forest-labs/flux-kontext-pro (image editing)

use crate::error::ProviderError;
use crate::http::{build_client, ensure_success, job_id_segment, read_json, trim_base_url};
use crate::poller::JobStatusSource;
use crate::status::{output_urls, JobSnapshot, JobStatus};
use async_trait::async_trait;
use genstudio_core::models::EditImageRequest;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::OnceLock;

pub const REPLICATE_API_BASE: &str = "https://api.replicate.com/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/flux-kontext-pro";

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    id: String,
    status: String,
    output: Option<Value>,
    error: Option<Value>,
    logs: Option<String>,
}

/// Replicate API client
#[derive(Clone)]
pub struct ReplicateClient {
    http_client: reqwest::Client,
    base_url: String,
    api_token: String,
    image_model: String,
}

impl Debug for ReplicateClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ReplicateClient")
            .field("base_url", &self.base_url)
            .field("image_model", &self.image_model)
            .finish()
    }
}

impl ReplicateClient {
    pub fn new(api_token: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http_client: build_client()?,
            base_url: REPLICATE_API_BASE.to_string(),
            api_token: api_token.into(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    /// Create a prediction.
    ///
    /// `model` is either `owner/name` (latest official version), `owner/name:version` or a
    /// bare version id.
    #[tracing::instrument(skip(self, input))]
    pub async fn create_prediction(
        &self,
        model: &str,
        input: Value,
    ) -> Result<JobSnapshot, ProviderError> {
        let (url, body) = match model.split_once(':') {
            Some((_, version)) => (
                format!("{}/predictions", self.base_url),
                json!({ "version": version, "input": input }),
            ),
            None if model.contains('/') => (
                format!("{}/models/{}/predictions", self.base_url, model),
                json!({ "input": input }),
            ),
            None => (
                format!("{}/predictions", self.base_url),
                json!({ "version": model, "input": input }),
            ),
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let snapshot = snapshot_from_value(read_json(response).await?)?;
        tracing::info!(prediction_id = %snapshot.id, status = ?snapshot.status, "Replicate prediction created");
        Ok(snapshot)
    }

    /// Start an image edit with the configured image model.
    pub async fn edit_image(&self, request: &EditImageRequest) -> Result<JobSnapshot, ProviderError> {
        let input = edit_image_input(request)?;
        self.create_prediction(&self.image_model, input).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_prediction(&self, prediction_id: &str) -> Result<JobSnapshot, ProviderError> {
        let url = format!("{}/predictions/{}", self.base_url, job_id_segment(prediction_id)?);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        snapshot_from_value(read_json(response).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel_prediction(&self, prediction_id: &str) -> Result<JobSnapshot, ProviderError> {
        let url = format!(
            "{}/predictions/{}/cancel",
            self.base_url,
            job_id_segment(prediction_id)?
        );
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return self.get_prediction(prediction_id).await;
        }
        let raw: Value =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        snapshot_from_value(raw)
    }

    /// Fetch a generated file (output URLs are public for a limited time).
    pub async fn download_output(&self, url: &str) -> Result<bytes::Bytes, ProviderError> {
        let response = self.http_client.get(url).send().await?;
        Ok(ensure_success(response).await?.bytes().await?)
    }
}

#[async_trait]
impl JobStatusSource for ReplicateClient {
    async fn fetch_status(&self, job_id: &str) -> Result<JobSnapshot, ProviderError> {
        self.get_prediction(job_id).await
    }
}

fn edit_image_input(request: &EditImageRequest) -> Result<Value, ProviderError> {
    let prompt = request
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ProviderError::InvalidRequest("prompt is required".to_string()))?;
    let input_image = request
        .input_image
        .as_deref()
        .ok_or_else(|| ProviderError::InvalidRequest("input_image is required".to_string()))?;

    let mut input = Map::new();
    input.insert("prompt".to_string(), json!(prompt));
    input.insert("input_image".to_string(), json!(input_image));
    if let Some(ratio) = &request.aspect_ratio {
        input.insert("aspect_ratio".to_string(), json!(ratio));
    }
    if let Some(format) = &request.output_format {
        input.insert("output_format".to_string(), json!(format));
    }
    if let Some(tolerance) = request.safety_tolerance {
        input.insert("safety_tolerance".to_string(), json!(tolerance));
    }
    if let Some(seed) = request.seed {
        input.insert("seed".to_string(), json!(seed));
    }
    if let Some(upsampling) = request.prompt_upsampling {
        input.insert("prompt_upsampling".to_string(), json!(upsampling));
    }
    Ok(Value::Object(input))
}

fn map_status(prediction_id: &str, status: &str) -> JobStatus {
    match status {
        "starting" => JobStatus::Pending,
        "processing" => JobStatus::Processing,
        "succeeded" => JobStatus::Succeeded,
        "failed" => JobStatus::Failed,
        "canceled" => JobStatus::Canceled,
        other => {
            tracing::warn!(prediction_id = %prediction_id, status = %other, "Unknown prediction status");
            JobStatus::Processing
        }
    }
}

fn progress_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,3})%").expect("static regex is valid"))
}

/// Last `NN%` in the prediction logs, clamped to 100.
fn progress_from_logs(logs: &str) -> Option<f64> {
    progress_regex()
        .captures_iter(logs)
        .last()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|p| p.min(100.0))
}

fn error_text(error: Option<&Value>) -> Option<String> {
    match error? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn snapshot_from_value(raw: Value) -> Result<JobSnapshot, ProviderError> {
    let prediction: PredictionResponse =
        serde_json::from_value(raw.clone()).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let status = map_status(&prediction.id, &prediction.status);
    let progress = if status == JobStatus::Succeeded {
        Some(100.0)
    } else {
        prediction.logs.as_deref().and_then(progress_from_logs)
    };

    Ok(JobSnapshot {
        id: prediction.id,
        status,
        progress,
        output: output_urls(prediction.output.as_ref()),
        error: error_text(prediction.error.as_ref()),
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    async fn client(server: &mockito::ServerGuard) -> ReplicateClient {
        ReplicateClient::new("r8_test").unwrap().with_base_url(server.url())
    }

    #[test]
    fn maps_replicate_statuses() {
        assert_eq!(map_status("p", "starting"), JobStatus::Pending);
        assert_eq!(map_status("p", "processing"), JobStatus::Processing);
        assert_eq!(map_status("p", "succeeded"), JobStatus::Succeeded);
        assert_eq!(map_status("p", "failed"), JobStatus::Failed);
        assert_eq!(map_status("p", "canceled"), JobStatus::Canceled);
        assert_eq!(map_status("p", "queued"), JobStatus::Processing);
    }

    #[test]
    fn progress_uses_last_percentage() {
        assert_eq!(progress_from_logs("  5%|▌ \n 42%|████▏"), Some(42.0));
        assert_eq!(progress_from_logs("no progress yet"), None);
        assert_eq!(progress_from_logs("250%"), Some(100.0));
    }

    #[test]
    fn edit_input_skips_unset_fields() {
        let request = EditImageRequest {
            prompt: Some("  make it blue ".to_string()),
            input_image: Some("https://x/a.png".to_string()),
            safety_tolerance: Some(2),
            ..Default::default()
        };
        let input = edit_image_input(&request).unwrap();
        assert_eq!(
            input,
            json!({"prompt": "make it blue", "input_image": "https://x/a.png", "safety_tolerance": 2})
        );
    }

    #[tokio::test]
    async fn create_prediction_uses_model_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/black-forest-labs/flux-kontext-pro/predictions")
            .match_header("authorization", "Bearer r8_test")
            .match_body(Matcher::PartialJson(json!({"input": {"prompt": "p"}})))
            .with_status(201)
            .with_body(r#"{"id":"pred_1","status":"starting","output":null,"error":null,"logs":""}"#)
            .create_async()
            .await;

        let snapshot = client(&server)
            .await
            .create_prediction(DEFAULT_IMAGE_MODEL, json!({"prompt": "p"}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.id, "pred_1");
        assert_eq!(snapshot.status, JobStatus::Pending);
        assert!(snapshot.output.is_empty());
    }

    #[tokio::test]
    async fn create_prediction_with_version_uses_predictions_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predictions")
            .match_body(Matcher::PartialJson(json!({"version": "abc123"})))
            .with_status(201)
            .with_body(r#"{"id":"pred_2","status":"starting"}"#)
            .create_async()
            .await;

        client(&server)
            .await
            .create_prediction("owner/model:abc123", json!({}))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_prediction_normalizes_output_and_progress() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/predictions/pred_1")
            .with_status(200)
            .with_body(
                r#"{"id":"pred_1","status":"processing","output":null,"error":null,"logs":"10%\n57%"}"#,
            )
            .create_async()
            .await;
        let snapshot = client(&server).await.get_prediction("pred_1").await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Processing);
        assert_eq!(snapshot.progress, Some(57.0));

        let _done = server
            .mock("GET", "/predictions/pred_2")
            .with_status(200)
            .with_body(r#"{"id":"pred_2","status":"succeeded","output":"https://replicate.delivery/out.jpg"}"#)
            .create_async()
            .await;
        let snapshot = client(&server).await.get_prediction("pred_2").await.unwrap();
        assert_eq!(snapshot.output, vec!["https://replicate.delivery/out.jpg"]);
        assert_eq!(snapshot.progress, Some(100.0));
    }

    #[tokio::test]
    async fn api_errors_carry_status_line() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/predictions/missing")
            .with_status(404)
            .with_body(r#"{"detail":"Not found."}"#)
            .create_async()
            .await;

        let err = client(&server).await.get_prediction("missing").await.unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, r#"HTTP 404: Not Found - {"detail":"Not found."}"#);
                assert_eq!(genstudio_core::extract_error_message(&message, "x"), "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_returns_canceled_snapshot() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predictions/pred_1/cancel")
            .with_status(200)
            .with_body(r#"{"id":"pred_1","status":"canceled"}"#)
            .create_async()
            .await;

        let snapshot = client(&server).await.cancel_prediction("pred_1").await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Canceled);
    }

    #[tokio::test]
    async fn failed_prediction_exposes_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/predictions/pred_3")
            .with_status(200)
            .with_body(r#"{"id":"pred_3","status":"failed","error":"Prediction interrupted"}"#)
            .create_async()
            .await;

        let snapshot = client(&server).await.fetch_status("pred_3").await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("Prediction interrupted"));
    }

    #[tokio::test]
    async fn prediction_ids_cannot_leave_the_predictions_path() {
        let mut server = mockito::Server::new_async().await;
        let account = server
            .mock("GET", "/account")
            .with_status(200)
            .with_body(r#"{"username":"owner"}"#)
            .expect(0)
            .create_async()
            .await;
        let client = client(&server).await;

        let err = client.get_prediction("../account").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        let err = client.cancel_prediction("..%2Faccount").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        account.assert_async().await;
    }
}
