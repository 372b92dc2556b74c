use anyhow::Result;
use genstudio_core::models::MediaAsset;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const MEDIA_ASSET_COLUMNS: &str = "id, user_id, project_id, kind, storage_path, url, filename, \
                                   content_type, file_size, created_at, updated_at";

#[derive(Clone)]
pub struct MediaAssetRepository {
    pool: PgPool,
}

impl MediaAssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_assets", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, user_id: &str, id: Uuid) -> Result<Option<MediaAsset>> {
        let query = format!(
            "SELECT {} FROM media_assets WHERE id = $1 AND user_id = $2",
            MEDIA_ASSET_COLUMNS
        );
        let asset = sqlx::query_as::<Postgres, MediaAsset>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(asset)
    }

    /// Newest first.
    #[tracing::instrument(skip(self), fields(db.table = "media_assets", db.operation = "select"))]
    pub async fn list_by_project(&self, user_id: &str, project_id: Uuid) -> Result<Vec<MediaAsset>> {
        let query = format!(
            "SELECT {} FROM media_assets WHERE project_id = $1 AND user_id = $2 \
             ORDER BY created_at DESC",
            MEDIA_ASSET_COLUMNS
        );
        let assets = sqlx::query_as::<Postgres, MediaAsset>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(assets)
    }
}
