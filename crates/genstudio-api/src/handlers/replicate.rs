//! Image editing through Replicate predictions.

use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::JobResponse;
use crate::services::generation::sync_edited_image;
use crate::services::references::{
    ensure_project, owned_edited_image, resolve_lineage, resolve_media_reference, resolve_owned,
};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use genstudio_core::models::{EditImageRequest, NewEditedImage};
use genstudio_core::validation::validate_edit_image_request;
use genstudio_providers::JobSnapshot;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePredictionRequest {
    #[serde(flatten)]
    pub edit: EditImageRequest,
    /// Attach the edit to this project
    pub project_id: Option<Uuid>,
    pub source_asset_id: Option<Uuid>,
    pub lineage_id: Option<Uuid>,
    /// Poll until the prediction finishes before responding
    #[serde(default)]
    pub wait: bool,
}

#[utoipa::path(
    post,
    path = "/api/replicate/predictions",
    tag = "replicate",
    request_body = CreatePredictionRequest,
    responses(
        (status = 201, description = "Prediction created", body = JobResponse),
        (status = 400, description = "Invalid request or rejected by Replicate", body = ErrorResponse),
        (status = 403, description = "Input image belongs to another user", body = ErrorResponse),
        (status = 404, description = "Project, asset or lineage not found", body = ErrorResponse),
        (status = 502, description = "Prediction failed", body = ErrorResponse),
        (status = 504, description = "Prediction did not finish in time", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, body),
    fields(user_id = %user.user_id, project_id = ?body.project_id, wait = body.wait, operation = "create_prediction")
)]
pub async fn create_prediction(
    user: UserContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<CreatePredictionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_edit_image_request(&body.edit).into_result()?;

    let lineage_id = match body.project_id {
        Some(project_id) => {
            ensure_project(state.store.as_ref(), &user.user_id, project_id).await?;
            resolve_lineage(
                state.store.as_ref(),
                &user.user_id,
                Some(project_id),
                body.source_asset_id,
                body.lineage_id,
            )
            .await?
        }
        None => None,
    };

    let mut edit = body.edit.clone();
    if let Some(input_image) = edit.input_image.as_deref() {
        edit.input_image = Some(resolve_media_reference(&state, &user, input_image).await?);
    }

    let created = state.replicate.edit_image(&edit).await?;

    let image = state
        .store
        .create_edited_image(NewEditedImage {
            user_id: user.user_id.clone(),
            project_id: body.project_id,
            source_asset_id: body.source_asset_id,
            lineage_id,
            prompt: body.edit.prompt.clone().unwrap_or_default(),
            prediction_id: created.id.clone(),
        })
        .await?;
    tracing::info!(edited_image_id = %image.id, prediction_id = %created.id, "Edited image recorded");
    let record_id = Some(image.id);

    if !body.wait {
        let mut response = JobResponse::new(created);
        response.record_id = record_id;
        return Ok((StatusCode::CREATED, Json(response)));
    }

    let mut last: Option<JobSnapshot> = None;
    let result = state
        .replicate_poller()
        .poll(&state.replicate, &created.id, |snapshot| {
            tracing::debug!(
                prediction_id = %snapshot.id,
                status = ?snapshot.status,
                progress = ?snapshot.progress,
                "Prediction progress"
            );
            last = Some(snapshot.clone());
        })
        .await;

    let record = match last.as_ref() {
        Some(snapshot) => sync_edited_image(&state, image, snapshot).await?,
        None => image,
    };

    let finished = result?;
    let mut response = JobResponse::new(finished);
    response.record_id = record_id;
    response.record = Some(resolve_owned(&state, &user, &record).await?);
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/replicate/predictions/{id}",
    tag = "replicate",
    params(("id" = String, Path, description = "Replicate prediction id")),
    responses(
        (status = 200, description = "Current prediction state", body = JobResponse),
        (status = 400, description = "Rejected by Replicate", body = ErrorResponse),
        (status = 404, description = "No prediction of the caller has this id", body = ErrorResponse),
        (status = 500, description = "Replicate unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, operation = "get_prediction"))]
pub async fn get_prediction(
    user: UserContext,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let image = owned_edited_image(state.store.as_ref(), &user.user_id, &id).await?;
    let snapshot = state.replicate.get_prediction(&id).await?;
    let record = sync_edited_image(&state, image, &snapshot).await?;

    let mut response = JobResponse::new(snapshot);
    response.record_id = Some(record.id);
    response.record = Some(resolve_owned(&state, &user, &record).await?);
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/replicate/predictions/{id}/cancel",
    tag = "replicate",
    params(("id" = String, Path, description = "Replicate prediction id")),
    responses(
        (status = 200, description = "Prediction canceled", body = JobResponse),
        (status = 400, description = "Rejected by Replicate", body = ErrorResponse),
        (status = 404, description = "No prediction of the caller has this id", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, operation = "cancel_prediction"))]
pub async fn cancel_prediction(
    user: UserContext,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let image = owned_edited_image(state.store.as_ref(), &user.user_id, &id).await?;
    let snapshot = state.replicate.cancel_prediction(&id).await?;
    tracing::info!(prediction_id = %id, status = ?snapshot.status, "Prediction cancel requested");
    let record = sync_edited_image(&state, image, &snapshot).await?;

    let mut response = JobResponse::new(snapshot);
    response.record_id = Some(record.id);
    Ok(Json(response))
}
