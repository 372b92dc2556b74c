use anyhow::{Context, Result};
use chrono::Utc;
use genstudio_core::models::{EditedImage, GenerationStatus, NewEditedImage};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const EDITED_IMAGE_COLUMNS: &str = "id, user_id, project_id, source_asset_id, lineage_id, prompt, \
                                    prediction_id, status, storage_path, result_url, error, \
                                    created_at, updated_at";

#[derive(Clone)]
pub struct EditedImageRepository {
    pool: PgPool,
}

impl EditedImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a submitted prediction. New rows start in `processing`.
    #[tracing::instrument(skip(self, new), fields(db.table = "edited_images", db.operation = "insert", prediction_id = %new.prediction_id))]
    pub async fn create(&self, new: NewEditedImage) -> Result<EditedImage> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO edited_images \
             (id, user_id, project_id, source_asset_id, lineage_id, prompt, prediction_id, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
             RETURNING {}",
            EDITED_IMAGE_COLUMNS
        );

        let image = sqlx::query_as::<Postgres, EditedImage>(&query)
            .bind(Uuid::new_v4())
            .bind(&new.user_id)
            .bind(new.project_id)
            .bind(new.source_asset_id)
            .bind(new.lineage_id)
            .bind(&new.prompt)
            .bind(&new.prediction_id)
            .bind(GenerationStatus::Processing)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .context("Failed to create edited image")?;

        Ok(image)
    }

    #[tracing::instrument(skip(self), fields(db.table = "edited_images", db.operation = "select"))]
    pub async fn get_by_prediction(
        &self,
        user_id: &str,
        prediction_id: &str,
    ) -> Result<Option<EditedImage>> {
        let query = format!(
            "SELECT {} FROM edited_images WHERE prediction_id = $1 AND user_id = $2",
            EDITED_IMAGE_COLUMNS
        );
        let image = sqlx::query_as::<Postgres, EditedImage>(&query)
            .bind(prediction_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(image)
    }

    /// Store the outcome of a prediction. `None` values keep what is already stored.
    #[tracing::instrument(skip(self, result_url, error), fields(db.table = "edited_images", db.operation = "update"))]
    pub async fn update_result(
        &self,
        prediction_id: &str,
        status: GenerationStatus,
        result_url: Option<&str>,
        error: Option<&str>,
    ) -> Result<Option<EditedImage>> {
        let query = format!(
            "UPDATE edited_images SET \
               status = $2, \
               result_url = COALESCE($3, result_url), \
               error = COALESCE($4, error), \
               updated_at = $5 \
             WHERE prediction_id = $1 \
             RETURNING {}",
            EDITED_IMAGE_COLUMNS
        );
        let image = sqlx::query_as::<Postgres, EditedImage>(&query)
            .bind(prediction_id)
            .bind(status)
            .bind(result_url)
            .bind(error)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update edited image")?;

        Ok(image)
    }
}
