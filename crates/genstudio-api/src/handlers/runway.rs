//! Image-to-video generation through Runway tasks.

use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::JobResponse;
use crate::services::generation::sync_generated_video;
use crate::services::references::{
    ensure_project, owned_generated_video, resolve_lineage, resolve_media_reference,
    resolve_owned,
};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use genstudio_core::models::{GenerateVideoRequest, GenerationStatus, NewGeneratedVideo, UpdateGeneratedVideo};
use genstudio_core::validation::validate_generate_video_request;
use genstudio_providers::{JobSnapshot, JobStatus};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVideoJobRequest {
    #[serde(flatten)]
    pub video: GenerateVideoRequest,
    pub project_id: Option<Uuid>,
    pub source_asset_id: Option<Uuid>,
    pub lineage_id: Option<Uuid>,
    /// Poll until the task finishes before responding
    #[serde(default)]
    pub wait: bool,
}

#[utoipa::path(
    post,
    path = "/api/runway/jobs",
    tag = "runway",
    request_body = CreateVideoJobRequest,
    responses(
        (status = 201, description = "Task created", body = JobResponse),
        (status = 400, description = "Invalid request or rejected by Runway", body = ErrorResponse),
        (status = 403, description = "Prompt image belongs to another user", body = ErrorResponse),
        (status = 404, description = "Project, asset or lineage not found", body = ErrorResponse),
        (status = 502, description = "Task failed", body = ErrorResponse),
        (status = 504, description = "Task did not finish in time", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, body),
    fields(user_id = %user.user_id, project_id = ?body.project_id, wait = body.wait, operation = "create_video_job")
)]
pub async fn create_job(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<CreateVideoJobRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_generate_video_request(&body.video).into_result()?;

    if let Some(project_id) = body.project_id {
        ensure_project(state.store.as_ref(), &user.user_id, project_id).await?;
    }
    let lineage_id = resolve_lineage(
        state.store.as_ref(),
        &user.user_id,
        body.project_id,
        body.source_asset_id,
        body.lineage_id,
    )
    .await?;

    let mut video_request = body.video.clone();
    if let Some(prompt_image) = video_request.prompt_image.as_deref() {
        video_request.prompt_image =
            Some(resolve_media_reference(&state, &user, prompt_image).await?);
    }

    let task_id = state.runway.image_to_video(&video_request).await?;

    let video = state
        .store
        .create_generated_video(NewGeneratedVideo {
            user_id: user.user_id.clone(),
            project_id: body.project_id,
            source_asset_id: body.source_asset_id,
            lineage_id,
            prompt: body.video.prompt_text.clone(),
            model: body.video.resolved_model().as_str().to_string(),
            ratio: body.video.ratio.clone().unwrap_or_default(),
            duration: body.video.resolved_duration() as i32,
            task_id: task_id.clone(),
        })
        .await?;
    tracing::info!(video_id = %video.id, task_id = %task_id, "Generated video recorded");

    if !body.wait {
        let mut response = JobResponse::new(pending_snapshot(&task_id));
        response.record_id = Some(video.id);
        return Ok((StatusCode::CREATED, Json(response)));
    }

    let mut last: Option<JobSnapshot> = None;
    let result = state
        .runway_poller()
        .poll(&state.runway, &task_id, |snapshot| {
            tracing::debug!(
                task_id = %snapshot.id,
                status = ?snapshot.status,
                progress = ?snapshot.progress,
                "Video task progress"
            );
            last = Some(snapshot.clone());
        })
        .await;

    let record_id = video.id;
    let record = match last.as_ref() {
        Some(snapshot) => sync_generated_video(&state, video, snapshot).await?,
        None => video,
    };

    let finished = result?;
    let mut response = JobResponse::new(finished);
    response.record_id = Some(record_id);
    response.record = Some(resolve_owned(&state, &user, &record).await?);
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/runway/jobs/{id}",
    tag = "runway",
    params(("id" = String, Path, description = "Runway task id")),
    responses(
        (status = 200, description = "Current task state", body = JobResponse),
        (status = 400, description = "Rejected by Runway", body = ErrorResponse),
        (status = 404, description = "No video task of the caller has this id", body = ErrorResponse),
        (status = 500, description = "Runway unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, operation = "get_video_job"))]
pub async fn get_job(
    user: UserContext,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = owned_generated_video(state.store.as_ref(), &user.user_id, &id).await?;
    let snapshot = state.runway.get_task(&id).await?;
    let record = sync_generated_video(&state, video, &snapshot).await?;

    let mut response = JobResponse::new(snapshot);
    response.record_id = Some(record.id);
    response.record = Some(resolve_owned(&state, &user, &record).await?);
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/runway/jobs/{id}",
    tag = "runway",
    params(("id" = String, Path, description = "Runway task id")),
    responses(
        (status = 204, description = "Task canceled"),
        (status = 400, description = "Rejected by Runway", body = ErrorResponse),
        (status = 404, description = "No video task of the caller has this id", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, operation = "cancel_video_job"))]
pub async fn cancel_job(
    user: UserContext,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = owned_generated_video(state.store.as_ref(), &user.user_id, &id).await?;
    state.runway.cancel_task(&id).await?;

    if !video.status.is_terminal() {
        let update = UpdateGeneratedVideo {
            status: Some(GenerationStatus::Canceled),
            error: Some("Canceled".to_string()),
            ..Default::default()
        };
        state
            .store
            .update_generated_video(&user.user_id, video.id, update)
            .await?;
    }
    tracing::info!(video_id = %video.id, task_id = %id, "Video task canceled");

    Ok(StatusCode::NO_CONTENT)
}

/// Snapshot for a task that was just accepted and has not been polled yet.
fn pending_snapshot(task_id: &str) -> JobSnapshot {
    JobSnapshot {
        id: task_id.to_string(),
        status: JobStatus::Pending,
        progress: None,
        output: Vec::new(),
        error: None,
        raw: json!({ "id": task_id }),
    }
}
