//! Keeps persisted generation records in step with what the providers report.

use crate::error::HttpAppError;
use crate::state::AppState;
use genstudio_core::models::{EditedImage, GeneratedVideo, GenerationStatus, UpdateGeneratedVideo};
use genstudio_providers::{JobSnapshot, JobStatus};
use genstudio_storage::generated_video_path;

const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Record a terminal prediction result on the caller's edited image.
#[tracing::instrument(skip(state, row, snapshot), fields(edited_image_id = %row.id, prediction_id = %snapshot.id, status = ?snapshot.status))]
pub async fn sync_edited_image(
    state: &AppState,
    row: EditedImage,
    snapshot: &JobSnapshot,
) -> Result<EditedImage, HttpAppError> {
    let status = GenerationStatus::from(snapshot.status);
    if !status.is_terminal() || row.status == status {
        return Ok(row);
    }

    let error = failure_message(snapshot);
    let updated = state
        .store
        .update_edited_image_result(&snapshot.id, status, snapshot.first_output(), error.as_deref())
        .await?;
    tracing::info!("Edited image updated from prediction");
    Ok(updated.unwrap_or(row))
}

/// Bring the generated video for a task up to date with `snapshot`.
///
/// On success the provider output is copied into the uploads bucket under
/// `{user_id}/{project_id}/videos/{video_id}.mp4`. A failed copy keeps the provider URL and
/// is retried on the next status check.
#[tracing::instrument(skip(state, video, snapshot), fields(video_id = %video.id, task_id = %snapshot.id, status = ?snapshot.status))]
pub async fn sync_generated_video(
    state: &AppState,
    video: GeneratedVideo,
    snapshot: &JobSnapshot,
) -> Result<GeneratedVideo, HttpAppError> {
    let update = match snapshot.status {
        JobStatus::Succeeded if video.storage_path.is_some() => return Ok(video),
        JobStatus::Succeeded => {
            let output = snapshot.first_output().map(str::to_string);
            let storage_path = match output.as_deref() {
                Some(url) => archive_video(state, &video, url).await,
                None => None,
            };
            UpdateGeneratedVideo {
                status: Some(GenerationStatus::Succeeded),
                storage_path,
                video_url: output,
                ..Default::default()
            }
        }
        JobStatus::Pending | JobStatus::Processing => return Ok(video),
        status => {
            let status = GenerationStatus::from(status);
            if video.status == status {
                return Ok(video);
            }
            UpdateGeneratedVideo {
                status: Some(status),
                error: failure_message(snapshot),
                ..Default::default()
            }
        }
    };

    let updated = state
        .store
        .update_generated_video(&video.user_id, video.id, update)
        .await?;
    Ok(updated.unwrap_or(video))
}

async fn archive_video(state: &AppState, video: &GeneratedVideo, url: &str) -> Option<String> {
    let path = generated_video_path(&video.user_id, video.project_id, video.id);
    let bucket = state.config.signed_url_bucket.as_str();

    let data = match state.runway.download_output(url).await {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(error = %e, video_id = %video.id, "Failed to download generated video");
            return None;
        }
    };
    let size = data.len();

    match state.storage.upload(bucket, &path, VIDEO_CONTENT_TYPE, data).await {
        Ok(()) => {
            tracing::info!(video_id = %video.id, path = %path, size, "Generated video stored");
            Some(path)
        }
        Err(e) => {
            tracing::warn!(error = %e, video_id = %video.id, "Failed to store generated video");
            None
        }
    }
}

fn failure_message(snapshot: &JobSnapshot) -> Option<String> {
    match snapshot.status {
        JobStatus::Failed => Some(
            snapshot
                .error
                .clone()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "Unknown error".to_string()),
        ),
        JobStatus::Canceled => Some("Canceled".to_string()),
        _ => None,
    }
}
