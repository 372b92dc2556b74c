//! Signed URL issuance for private storage objects.

use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use genstudio_core::AppError;
use genstudio_storage::{belongs_to_user, clamp_expiry, DEFAULT_EXPIRY_SECS, MAX_EXPIRY_SECS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

pub const EXTERNAL_DEFAULT_EXPIRY_SECS: u64 = 60;
pub const EXTERNAL_MAX_EXPIRY_SECS: u64 = 120;
const MAX_PATHS_PER_REQUEST: usize = 100;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignedUrlsRequest {
    /// Storage paths to sign
    #[serde(default)]
    pub paths: Vec<String>,
    /// Arbitrary JSON whose storage-path strings should be replaced by signed URLs
    #[schema(value_type = Option<Object>)]
    pub value: Option<Value>,
    /// Seconds, default 300, capped at 600
    pub expires_in: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignedUrlsResponse {
    /// path → signed URL, for every path that could be signed
    pub signed_urls: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub value: Option<Value>,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExternalSignedUrlsRequest {
    pub bucket: String,
    pub paths: Vec<String>,
    /// Seconds, default 60, capped at 120
    pub expires_in: Option<u64>,
}

fn check_path_count(paths: &[String]) -> Result<(), HttpAppError> {
    if paths.len() > MAX_PATHS_PER_REQUEST {
        return Err(AppError::InvalidInput(format!(
            "At most {} paths can be signed per request",
            MAX_PATHS_PER_REQUEST
        ))
        .into());
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/signed-urls",
    tag = "storage",
    request_body = SignedUrlsRequest,
    responses(
        (status = 200, description = "Signed URLs for the caller's paths", body = SignedUrlsResponse),
        (status = 400, description = "Neither paths nor value supplied", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, body),
    fields(user_id = %user.user_id, path_count = body.paths.len(), operation = "sign_urls")
)]
pub async fn create_signed_urls(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<SignedUrlsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if body.paths.is_empty() && body.value.is_none() {
        return Err(AppError::InvalidInput("Provide paths or value to sign".to_string()).into());
    }
    check_path_count(&body.paths)?;

    let expires_in = clamp_expiry(body.expires_in, DEFAULT_EXPIRY_SECS, MAX_EXPIRY_SECS);
    let resolver = state.resolver_for(&state.config.signed_url_bucket, Some(expires_in));

    let (owned, foreign): (Vec<String>, Vec<String>) = body
        .paths
        .into_iter()
        .partition(|path| belongs_to_user(path, &user.user_id));
    if !foreign.is_empty() {
        tracing::warn!(count = foreign.len(), "Refusing to sign paths outside the caller's prefix");
    }

    let signed_urls = resolver.sign_paths(&owned).await;

    let value = match body.value {
        Some(value) => Some(
            resolver
                .resolve_where(value, |path| belongs_to_user(path, &user.user_id))
                .await,
        ),
        None => None,
    };

    Ok(Json(SignedUrlsResponse {
        signed_urls,
        value,
        expires_in,
    }))
}

#[utoipa::path(
    post,
    path = "/api/signed-urls/external",
    tag = "storage",
    request_body = ExternalSignedUrlsRequest,
    responses(
        (status = 200, description = "Signed URLs", body = SignedUrlsResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Bucket not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, body),
    fields(user_id = %user.user_id, bucket = %body.bucket, path_count = body.paths.len(), operation = "sign_external_urls")
)]
pub async fn create_external_signed_urls(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<ExternalSignedUrlsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !state
        .config
        .external_signed_url_buckets
        .iter()
        .any(|b| b == &body.bucket)
    {
        return Err(AppError::Forbidden(format!("Bucket '{}' is not allowed", body.bucket)).into());
    }
    if body.paths.is_empty() {
        return Err(AppError::InvalidInput("paths must not be empty".to_string()).into());
    }
    check_path_count(&body.paths)?;

    let expires_in = clamp_expiry(
        body.expires_in,
        EXTERNAL_DEFAULT_EXPIRY_SECS,
        EXTERNAL_MAX_EXPIRY_SECS,
    );
    let resolver = state.resolver_for(&body.bucket, Some(expires_in));
    let signed_urls = resolver.sign_paths(&body.paths).await;

    Ok(Json(SignedUrlsResponse {
        signed_urls,
        value: None,
        expires_in,
    }))
}
