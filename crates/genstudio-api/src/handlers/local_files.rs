//! Serves objects of the local storage backend behind HMAC-signed URLs.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use genstudio_core::AppError;
use genstudio_storage::token::TokenError;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[tracing::instrument(skip(state, query), fields(bucket = %bucket, path = %path))]
pub async fn serve_local_file(
    Path((bucket, path)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let local = state
        .local_storage
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Local storage is not enabled".to_string()))?;

    let token = query
        .token
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("Missing signed URL token".to_string()))?;

    local
        .verify_token(&bucket, &path, token)
        .map_err(|e| match e {
            TokenError::Expired => AppError::Forbidden("Signed URL has expired".to_string()),
            TokenError::Invalid => AppError::Forbidden("Invalid signed URL".to_string()),
        })?;

    let data = local.download(&bucket, &path).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(&path)),
            (header::CACHE_CONTROL, "private, max-age=60"),
        ],
        data,
    ))
}

fn content_type_for(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}
