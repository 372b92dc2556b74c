use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::references::{ensure_project, resolve_owned};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use genstudio_core::models::{GeneratedVideo, UpdateGeneratedVideo};
use genstudio_core::AppError;
use genstudio_storage::belongs_to_user;
use std::sync::Arc;
use uuid::Uuid;

fn not_found() -> HttpAppError {
    AppError::NotFound("Generated video not found".to_string()).into()
}

#[utoipa::path(
    get,
    path = "/api/generated-videos/{id}",
    tag = "generated-videos",
    params(("id" = Uuid, Path, description = "Generated video ID")),
    responses(
        (status = 200, description = "Generated video with signed URLs", body = GeneratedVideo),
        (status = 404, description = "Generated video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, video_id = %id, operation = "get_generated_video"))]
pub async fn get_generated_video(
    user: UserContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state
        .store
        .get_generated_video(&user.user_id, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(resolve_owned(&state, &user, &video).await?))
}

#[utoipa::path(
    patch,
    path = "/api/generated-videos/{id}",
    tag = "generated-videos",
    params(("id" = Uuid, Path, description = "Generated video ID")),
    request_body = UpdateGeneratedVideo,
    responses(
        (status = 200, description = "Updated generated video", body = GeneratedVideo),
        (status = 400, description = "Empty or invalid update", body = ErrorResponse),
        (status = 404, description = "Generated video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, update), fields(user_id = %user.user_id, video_id = %id, operation = "update_generated_video"))]
pub async fn update_generated_video(
    user: UserContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    ValidatedJson(update): ValidatedJson<UpdateGeneratedVideo>,
) -> Result<impl IntoResponse, HttpAppError> {
    if update.is_empty() {
        return Err(AppError::InvalidInput("No fields to update".to_string()).into());
    }
    for (field, path) in [
        ("storage_path", update.storage_path.as_deref()),
        ("thumbnail_path", update.thumbnail_path.as_deref()),
    ] {
        if let Some(path) = path {
            if !belongs_to_user(path, &user.user_id) {
                return Err(AppError::InvalidInput(format!(
                    "{} must be a path under the caller's prefix",
                    field
                ))
                .into());
            }
        }
    }

    let video = state
        .store
        .update_generated_video(&user.user_id, id, update)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(video_id = %video.id, "Generated video updated");

    Ok(Json(resolve_owned(&state, &user, &video).await?))
}

#[utoipa::path(
    delete,
    path = "/api/generated-videos/{id}",
    tag = "generated-videos",
    params(("id" = Uuid, Path, description = "Generated video ID")),
    responses(
        (status = 204, description = "Generated video deleted"),
        (status = 404, description = "Generated video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, video_id = %id, operation = "delete_generated_video"))]
pub async fn delete_generated_video(
    user: UserContext,
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state
        .store
        .delete_generated_video(&user.user_id, id)
        .await?
        .ok_or_else(not_found)?;

    let objects: Vec<String> = [video.storage_path, video.thumbnail_path]
        .into_iter()
        .flatten()
        .filter(|path| belongs_to_user(path, &user.user_id))
        .collect();

    if !objects.is_empty() {
        if let Err(e) = state
            .storage
            .delete(&state.config.signed_url_bucket, &objects)
            .await
        {
            tracing::warn!(error = %e, video_id = %id, "Failed to delete stored video objects");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/generated-videos",
    tag = "generated-videos",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Generated videos of the project", body = Vec<GeneratedVideo>),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, project_id = %project_id, operation = "list_generated_videos"))]
pub async fn list_project_videos(
    user: UserContext,
    Path(project_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    ensure_project(state.store.as_ref(), &user.user_id, project_id).await?;

    let videos = state
        .store
        .list_generated_videos(&user.user_id, project_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list generated videos");
            HttpAppError::from(e)
        })?;

    Ok(Json(resolve_owned(&state, &user, &videos).await?))
}
