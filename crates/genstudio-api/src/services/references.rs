//! Ownership checks and storage-path resolution for request and response payloads.

use crate::auth::UserContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use genstudio_core::models::{EditedImage, GeneratedVideo};
use genstudio_core::validation::is_absolute_url;
use genstudio_core::AppError;
use genstudio_db::GenerationStore;
use genstudio_storage::belongs_to_user;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Turn a client-supplied media reference into something a provider can fetch.
///
/// Absolute URLs and `data:` URIs pass through. Anything else is treated as a path in the
/// uploads bucket, must live under the caller's prefix and is replaced by a signed URL.
pub async fn resolve_media_reference(
    state: &AppState,
    user: &UserContext,
    reference: &str,
) -> Result<String, HttpAppError> {
    if is_absolute_url(reference) || reference.starts_with("data:") {
        return Ok(reference.to_string());
    }

    if !belongs_to_user(reference, &user.user_id) {
        return Err(AppError::Forbidden(
            "Storage path does not belong to the current user".to_string(),
        )
        .into());
    }

    let resolver = state.resolver();
    let url = state
        .storage
        .create_signed_url(resolver.bucket(), reference, resolver.expires_in())
        .await?;
    tracing::debug!(path = %reference, "Resolved storage path for provider input");
    Ok(url)
}

/// Serialize `record` and replace the caller's storage paths with signed URLs.
pub async fn resolve_owned<T: Serialize>(
    state: &AppState,
    user: &UserContext,
    record: &T,
) -> Result<Value, HttpAppError> {
    let value = serde_json::to_value(record).map_err(AppError::from)?;
    Ok(state
        .resolver()
        .resolve_where(value, |path| belongs_to_user(path, &user.user_id))
        .await)
}

pub async fn ensure_project(
    store: &dyn GenerationStore,
    user_id: &str,
    project_id: Uuid,
) -> Result<(), HttpAppError> {
    store
        .get_project(user_id, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    Ok(())
}

/// The caller's edited image for a prediction. Predictions started by other users are reported
/// as missing.
pub async fn owned_edited_image(
    store: &dyn GenerationStore,
    user_id: &str,
    prediction_id: &str,
) -> Result<EditedImage, HttpAppError> {
    Ok(store
        .get_edited_image_by_prediction(user_id, prediction_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Prediction not found".to_string()))?)
}

/// The caller's generated video for a Runway task, 404 otherwise.
pub async fn owned_generated_video(
    store: &dyn GenerationStore,
    user_id: &str,
    task_id: &str,
) -> Result<GeneratedVideo, HttpAppError> {
    Ok(store
        .get_generated_video_by_task(user_id, task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video task not found".to_string()))?)
}

/// Pick the lineage a new generation belongs to.
///
/// An explicit `lineage_id` must exist. Without one, a source asset inside a project starts a
/// new lineage rooted at that asset. Otherwise the generation has no lineage.
pub async fn resolve_lineage(
    store: &dyn GenerationStore,
    user_id: &str,
    project_id: Option<Uuid>,
    source_asset_id: Option<Uuid>,
    lineage_id: Option<Uuid>,
) -> Result<Option<Uuid>, HttpAppError> {
    if let Some(lineage_id) = lineage_id {
        store
            .get_lineage(user_id, lineage_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lineage not found".to_string()))?;
        return Ok(Some(lineage_id));
    }

    let (Some(project_id), Some(source_asset_id)) = (project_id, source_asset_id) else {
        return Ok(None);
    };

    store
        .get_media_asset(user_id, source_asset_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Source asset not found".to_string()))?;

    let lineage = store
        .create_lineage(user_id, project_id, Some(source_asset_id))
        .await?;
    tracing::info!(lineage_id = %lineage.id, root_asset_id = %source_asset_id, "Lineage created");
    Ok(Some(lineage.id))
}
