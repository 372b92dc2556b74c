use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::GenerationStatus;

/// A video produced by an image-to-video task.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct GeneratedVideo {
    pub id: Uuid,
    pub user_id: String,
    pub project_id: Option<Uuid>,
    pub source_asset_id: Option<Uuid>,
    pub lineage_id: Option<Uuid>,
    pub title: Option<String>,
    pub prompt: Option<String>,
    pub model: String,
    pub ratio: String,
    pub duration: i32,
    /// Provider task id used for status polling
    pub task_id: String,
    pub status: GenerationStatus,
    /// Bucket-relative key once the output has been copied into storage
    pub storage_path: Option<String>,
    /// Provider-hosted output URL (short-lived)
    pub video_url: Option<String>,
    pub thumbnail_path: Option<String>,
    pub error: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to record a freshly submitted video task.
#[derive(Debug, Clone)]
pub struct NewGeneratedVideo {
    pub user_id: String,
    pub project_id: Option<Uuid>,
    pub source_asset_id: Option<Uuid>,
    pub lineage_id: Option<Uuid>,
    pub prompt: Option<String>,
    pub model: String,
    pub ratio: String,
    pub duration: i32,
    pub task_id: String,
}

/// Partial update for `PATCH /api/generated-videos/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateGeneratedVideo {
    pub title: Option<String>,
    pub prompt: Option<String>,
    pub status: Option<GenerationStatus>,
    pub storage_path: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_path: Option<String>,
    pub error: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonValue>,
}

impl UpdateGeneratedVideo {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.prompt.is_none()
            && self.status.is_none()
            && self.storage_path.is_none()
            && self.video_url.is_none()
            && self.thumbnail_path.is_none()
            && self.error.is_none()
            && self.metadata.is_none()
    }
}
