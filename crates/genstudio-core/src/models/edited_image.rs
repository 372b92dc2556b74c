use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::GenerationStatus;

/// Result of an image-editing prediction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct EditedImage {
    pub id: Uuid,
    pub user_id: String,
    pub project_id: Option<Uuid>,
    pub source_asset_id: Option<Uuid>,
    pub lineage_id: Option<Uuid>,
    pub prompt: String,
    pub prediction_id: String,
    pub status: GenerationStatus,
    pub storage_path: Option<String>,
    pub result_url: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to record a freshly submitted edit.
#[derive(Debug, Clone)]
pub struct NewEditedImage {
    pub user_id: String,
    pub project_id: Option<Uuid>,
    pub source_asset_id: Option<Uuid>,
    pub lineage_id: Option<Uuid>,
    pub prompt: String,
    pub prediction_id: String,
}
