use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Chain of derived media starting from one root asset (edits of edits, videos of edits).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Lineage {
    pub id: Uuid,
    pub user_id: String,
    pub project_id: Uuid,
    pub root_asset_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
