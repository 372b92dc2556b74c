pub mod generated_videos;
pub mod health;
pub mod local_files;
pub mod media_assets;
pub mod replicate;
pub mod runway;
pub mod signed_urls;

use genstudio_providers::JobSnapshot;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Provider job state plus the database record tracking it, when there is one.
#[derive(Debug, Serialize, ToSchema)]
pub struct JobResponse {
    #[serde(flatten)]
    pub job: JobSnapshot,
    /// Id of the `EditedImage` / `GeneratedVideo` row for this job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
    /// The tracked record with storage paths resolved to signed URLs
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub record: Option<Value>,
}

impl JobResponse {
    pub fn new(job: JobSnapshot) -> Self {
        Self {
            job,
            record_id: None,
            record: None,
        }
    }
}
