use anyhow::{Context, Result};
use chrono::Utc;
use genstudio_core::models::{GeneratedVideo, GenerationStatus, NewGeneratedVideo, UpdateGeneratedVideo};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const GENERATED_VIDEO_COLUMNS: &str = "id, user_id, project_id, source_asset_id, lineage_id, title, \
                                       prompt, model, ratio, duration, task_id, status, \
                                       storage_path, video_url, thumbnail_path, error, metadata, \
                                       created_at, updated_at";

#[derive(Clone)]
pub struct GeneratedVideoRepository {
    pool: PgPool,
}

impl GeneratedVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, new), fields(db.table = "generated_videos", db.operation = "insert", task_id = %new.task_id))]
    pub async fn create(&self, new: NewGeneratedVideo) -> Result<GeneratedVideo> {
        let query = format!(
            "INSERT INTO generated_videos \
             (id, user_id, project_id, source_asset_id, lineage_id, prompt, model, ratio, duration, \
              task_id, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) \
             RETURNING {}",
            GENERATED_VIDEO_COLUMNS
        );

        let video = sqlx::query_as::<Postgres, GeneratedVideo>(&query)
            .bind(Uuid::new_v4())
            .bind(&new.user_id)
            .bind(new.project_id)
            .bind(new.source_asset_id)
            .bind(new.lineage_id)
            .bind(&new.prompt)
            .bind(&new.model)
            .bind(&new.ratio)
            .bind(new.duration)
            .bind(&new.task_id)
            .bind(GenerationStatus::Processing)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .context("Failed to create generated video")?;

        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "generated_videos", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, user_id: &str, id: Uuid) -> Result<Option<GeneratedVideo>> {
        let query = format!(
            "SELECT {} FROM generated_videos WHERE id = $1 AND user_id = $2",
            GENERATED_VIDEO_COLUMNS
        );
        let video = sqlx::query_as::<Postgres, GeneratedVideo>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "generated_videos", db.operation = "select"))]
    pub async fn get_by_task(&self, user_id: &str, task_id: &str) -> Result<Option<GeneratedVideo>> {
        let query = format!(
            "SELECT {} FROM generated_videos WHERE task_id = $1 AND user_id = $2",
            GENERATED_VIDEO_COLUMNS
        );
        let video = sqlx::query_as::<Postgres, GeneratedVideo>(&query)
            .bind(task_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    /// Newest first.
    #[tracing::instrument(skip(self), fields(db.table = "generated_videos", db.operation = "select"))]
    pub async fn list_by_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<Vec<GeneratedVideo>> {
        let query = format!(
            "SELECT {} FROM generated_videos WHERE project_id = $1 AND user_id = $2 \
             ORDER BY created_at DESC",
            GENERATED_VIDEO_COLUMNS
        );
        let videos = sqlx::query_as::<Postgres, GeneratedVideo>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }

    /// Apply a partial update. Absent fields keep their stored value.
    #[tracing::instrument(skip(self, update), fields(db.table = "generated_videos", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        user_id: &str,
        id: Uuid,
        update: UpdateGeneratedVideo,
    ) -> Result<Option<GeneratedVideo>> {
        let query = format!(
            "UPDATE generated_videos SET \
               title = COALESCE($3, title), \
               prompt = COALESCE($4, prompt), \
               status = COALESCE($5, status), \
               storage_path = COALESCE($6, storage_path), \
               video_url = COALESCE($7, video_url), \
               thumbnail_path = COALESCE($8, thumbnail_path), \
               error = COALESCE($9, error), \
               metadata = COALESCE($10, metadata), \
               updated_at = $11 \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {}",
            GENERATED_VIDEO_COLUMNS
        );

        let video = sqlx::query_as::<Postgres, GeneratedVideo>(&query)
            .bind(id)
            .bind(user_id)
            .bind(update.title)
            .bind(update.prompt)
            .bind(update.status)
            .bind(update.storage_path)
            .bind(update.video_url)
            .bind(update.thumbnail_path)
            .bind(update.error)
            .bind(update.metadata)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update generated video")?;

        Ok(video)
    }

    /// Delete and return the removed row so callers can clean up stored objects.
    #[tracing::instrument(skip(self), fields(db.table = "generated_videos", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, user_id: &str, id: Uuid) -> Result<Option<GeneratedVideo>> {
        let query = format!(
            "DELETE FROM generated_videos WHERE id = $1 AND user_id = $2 RETURNING {}",
            GENERATED_VIDEO_COLUMNS
        );
        let video = sqlx::query_as::<Postgres, GeneratedVideo>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to delete generated video")?;

        Ok(video)
    }
}
