//! Persistence seam used by the HTTP handlers.
//!
//! Handlers talk to `Arc<dyn GenerationStore>` so they can be exercised against an in-memory
//! implementation in tests; `PgGenerationStore` forwards to the sqlx repositories.

use anyhow::Result;
use async_trait::async_trait;
use genstudio_core::models::{
    EditedImage, GeneratedVideo, GenerationStatus, Lineage, MediaAsset, NewEditedImage,
    NewGeneratedVideo, Project, UpdateGeneratedVideo,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    EditedImageRepository, GeneratedVideoRepository, LineageRepository, MediaAssetRepository,
    ProjectRepository,
};

#[async_trait]
pub trait GenerationStore: Send + Sync {
    async fn get_project(&self, user_id: &str, id: Uuid) -> Result<Option<Project>>;

    async fn get_media_asset(&self, user_id: &str, id: Uuid) -> Result<Option<MediaAsset>>;

    async fn list_media_assets(&self, user_id: &str, project_id: Uuid) -> Result<Vec<MediaAsset>>;

    async fn create_lineage(
        &self,
        user_id: &str,
        project_id: Uuid,
        root_asset_id: Option<Uuid>,
    ) -> Result<Lineage>;

    async fn get_lineage(&self, user_id: &str, id: Uuid) -> Result<Option<Lineage>>;

    async fn create_edited_image(&self, new: NewEditedImage) -> Result<EditedImage>;

    async fn get_edited_image_by_prediction(
        &self,
        user_id: &str,
        prediction_id: &str,
    ) -> Result<Option<EditedImage>>;

    async fn update_edited_image_result(
        &self,
        prediction_id: &str,
        status: GenerationStatus,
        result_url: Option<&str>,
        error: Option<&str>,
    ) -> Result<Option<EditedImage>>;

    async fn create_generated_video(&self, new: NewGeneratedVideo) -> Result<GeneratedVideo>;

    async fn get_generated_video(&self, user_id: &str, id: Uuid) -> Result<Option<GeneratedVideo>>;

    async fn get_generated_video_by_task(
        &self,
        user_id: &str,
        task_id: &str,
    ) -> Result<Option<GeneratedVideo>>;

    async fn list_generated_videos(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<Vec<GeneratedVideo>>;

    async fn update_generated_video(
        &self,
        user_id: &str,
        id: Uuid,
        update: UpdateGeneratedVideo,
    ) -> Result<Option<GeneratedVideo>>;

    async fn delete_generated_video(&self, user_id: &str, id: Uuid) -> Result<Option<GeneratedVideo>>;

    /// Connectivity check for readiness probes.
    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct PgGenerationStore {
    pool: PgPool,
    projects: ProjectRepository,
    media_assets: MediaAssetRepository,
    lineages: LineageRepository,
    edited_images: EditedImageRepository,
    generated_videos: GeneratedVideoRepository,
}

impl PgGenerationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            projects: ProjectRepository::new(pool.clone()),
            media_assets: MediaAssetRepository::new(pool.clone()),
            lineages: LineageRepository::new(pool.clone()),
            edited_images: EditedImageRepository::new(pool.clone()),
            generated_videos: GeneratedVideoRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl GenerationStore for PgGenerationStore {
    async fn get_project(&self, user_id: &str, id: Uuid) -> Result<Option<Project>> {
        self.projects.get(user_id, id).await
    }

    async fn get_media_asset(&self, user_id: &str, id: Uuid) -> Result<Option<MediaAsset>> {
        self.media_assets.get(user_id, id).await
    }

    async fn list_media_assets(&self, user_id: &str, project_id: Uuid) -> Result<Vec<MediaAsset>> {
        self.media_assets.list_by_project(user_id, project_id).await
    }

    async fn create_lineage(
        &self,
        user_id: &str,
        project_id: Uuid,
        root_asset_id: Option<Uuid>,
    ) -> Result<Lineage> {
        self.lineages.create(user_id, project_id, root_asset_id).await
    }

    async fn get_lineage(&self, user_id: &str, id: Uuid) -> Result<Option<Lineage>> {
        self.lineages.get(user_id, id).await
    }

    async fn create_edited_image(&self, new: NewEditedImage) -> Result<EditedImage> {
        self.edited_images.create(new).await
    }

    async fn get_edited_image_by_prediction(
        &self,
        user_id: &str,
        prediction_id: &str,
    ) -> Result<Option<EditedImage>> {
        self.edited_images
            .get_by_prediction(user_id, prediction_id)
            .await
    }

    async fn update_edited_image_result(
        &self,
        prediction_id: &str,
        status: GenerationStatus,
        result_url: Option<&str>,
        error: Option<&str>,
    ) -> Result<Option<EditedImage>> {
        self.edited_images
            .update_result(prediction_id, status, result_url, error)
            .await
    }

    async fn create_generated_video(&self, new: NewGeneratedVideo) -> Result<GeneratedVideo> {
        self.generated_videos.create(new).await
    }

    async fn get_generated_video(&self, user_id: &str, id: Uuid) -> Result<Option<GeneratedVideo>> {
        self.generated_videos.get(user_id, id).await
    }

    async fn get_generated_video_by_task(
        &self,
        user_id: &str,
        task_id: &str,
    ) -> Result<Option<GeneratedVideo>> {
        self.generated_videos.get_by_task(user_id, task_id).await
    }

    async fn list_generated_videos(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<Vec<GeneratedVideo>> {
        self.generated_videos
            .list_by_project(user_id, project_id)
            .await
    }

    async fn update_generated_video(
        &self,
        user_id: &str,
        id: Uuid,
        update: UpdateGeneratedVideo,
    ) -> Result<Option<GeneratedVideo>> {
        self.generated_videos.update(user_id, id, update).await
    }

    async fn delete_generated_video(&self, user_id: &str, id: Uuid) -> Result<Option<GeneratedVideo>> {
        self.generated_videos.delete(user_id, id).await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
