use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::references::{ensure_project, resolve_owned};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use genstudio_core::models::MediaAsset;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/projects/{id}/media-assets",
    tag = "media-assets",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Media assets with signed URLs", body = Vec<MediaAsset>),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id, project_id = %project_id, operation = "list_media_assets"))]
pub async fn list_project_assets(
    user: UserContext,
    Path(project_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    ensure_project(state.store.as_ref(), &user.user_id, project_id).await?;

    let assets = state
        .store
        .list_media_assets(&user.user_id, project_id)
        .await?;

    Ok(Json(resolve_owned(&state, &user, &assets).await?))
}
