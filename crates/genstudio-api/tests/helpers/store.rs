//! In-memory `GenerationStore` so handler tests run without Postgres.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use genstudio_core::models::{
    EditedImage, GeneratedVideo, GenerationStatus, Lineage, MediaAsset, MediaKind,
    NewEditedImage, NewGeneratedVideo, Project, UpdateGeneratedVideo,
};
use genstudio_db::GenerationStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    projects: HashMap<Uuid, Project>,
    media_assets: HashMap<Uuid, MediaAsset>,
    lineages: HashMap<Uuid, Lineage>,
    edited_images: HashMap<Uuid, EditedImage>,
    generated_videos: HashMap<Uuid, GeneratedVideo>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn add_project(&self, user_id: &str) -> Project {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: "Launch campaign".to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .unwrap()
            .projects
            .insert(project.id, project.clone());
        project
    }

    pub fn add_image_asset(&self, user_id: &str, project_id: Uuid, filename: &str) -> MediaAsset {
        let now = Utc::now();
        let asset = MediaAsset {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            project_id,
            kind: MediaKind::Image,
            storage_path: Some(format!("{}/{}/{}", user_id, project_id, filename)),
            url: None,
            filename: filename.to_string(),
            content_type: "image/png".to_string(),
            file_size: 3,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .unwrap()
            .media_assets
            .insert(asset.id, asset.clone());
        asset
    }

    pub fn insert_video(&self, video: GeneratedVideo) {
        self.tables
            .lock()
            .unwrap()
            .generated_videos
            .insert(video.id, video);
    }

    pub fn video(&self, id: Uuid) -> Option<GeneratedVideo> {
        self.tables.lock().unwrap().generated_videos.get(&id).cloned()
    }

    /// A prediction started by `user_id` outside any project.
    pub fn add_edited_image(&self, user_id: &str, prediction_id: &str) -> EditedImage {
        let now = Utc::now();
        let image = EditedImage {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            project_id: None,
            source_asset_id: None,
            lineage_id: None,
            prompt: "make it blue".to_string(),
            prediction_id: prediction_id.to_string(),
            status: GenerationStatus::Processing,
            storage_path: None,
            result_url: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .unwrap()
            .edited_images
            .insert(image.id, image.clone());
        image
    }

    pub fn edited_image_by_prediction(&self, prediction_id: &str) -> Option<EditedImage> {
        self.tables
            .lock()
            .unwrap()
            .edited_images
            .values()
            .find(|i| i.prediction_id == prediction_id)
            .cloned()
    }

    pub fn lineage_count(&self) -> usize {
        self.tables.lock().unwrap().lineages.len()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl GenerationStore for MemoryStore {
    async fn get_project(&self, user_id: &str, id: Uuid) -> Result<Option<Project>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .projects
            .get(&id)
            .filter(|p| p.user_id == user_id)
            .cloned())
    }

    async fn get_media_asset(&self, user_id: &str, id: Uuid) -> Result<Option<MediaAsset>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .media_assets
            .get(&id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn list_media_assets(&self, user_id: &str, project_id: Uuid) -> Result<Vec<MediaAsset>> {
        let tables = self.tables.lock().unwrap();
        let mut assets: Vec<MediaAsset> = tables
            .media_assets
            .values()
            .filter(|a| a.user_id == user_id && a.project_id == project_id)
            .cloned()
            .collect();
        assets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(assets)
    }

    async fn create_lineage(
        &self,
        user_id: &str,
        project_id: Uuid,
        root_asset_id: Option<Uuid>,
    ) -> Result<Lineage> {
        let lineage = Lineage {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            project_id,
            root_asset_id,
            created_at: Utc::now(),
        };
        self.tables
            .lock()
            .unwrap()
            .lineages
            .insert(lineage.id, lineage.clone());
        Ok(lineage)
    }

    async fn get_lineage(&self, user_id: &str, id: Uuid) -> Result<Option<Lineage>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .lineages
            .get(&id)
            .filter(|l| l.user_id == user_id)
            .cloned())
    }

    async fn create_edited_image(&self, new: NewEditedImage) -> Result<EditedImage> {
        let now = Utc::now();
        let image = EditedImage {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            project_id: new.project_id,
            source_asset_id: new.source_asset_id,
            lineage_id: new.lineage_id,
            prompt: new.prompt,
            prediction_id: new.prediction_id,
            status: GenerationStatus::Processing,
            storage_path: None,
            result_url: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .lock()
            .unwrap()
            .edited_images
            .insert(image.id, image.clone());
        Ok(image)
    }

    async fn get_edited_image_by_prediction(
        &self,
        user_id: &str,
        prediction_id: &str,
    ) -> Result<Option<EditedImage>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .edited_images
            .values()
            .find(|i| i.user_id == user_id && i.prediction_id == prediction_id)
            .cloned())
    }

    async fn update_edited_image_result(
        &self,
        prediction_id: &str,
        status: GenerationStatus,
        result_url: Option<&str>,
        error: Option<&str>,
    ) -> Result<Option<EditedImage>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(image) = tables
            .edited_images
            .values_mut()
            .find(|i| i.prediction_id == prediction_id)
        else {
            return Ok(None);
        };
        image.status = status;
        if let Some(url) = result_url {
            image.result_url = Some(url.to_string());
        }
        image.error = error.map(str::to_string);
        image.updated_at = Utc::now();
        Ok(Some(image.clone()))
    }

    async fn create_generated_video(&self, new: NewGeneratedVideo) -> Result<GeneratedVideo> {
        let now = Utc::now();
        let video = GeneratedVideo {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            project_id: new.project_id,
            source_asset_id: new.source_asset_id,
            lineage_id: new.lineage_id,
            title: None,
            prompt: new.prompt,
            model: new.model,
            ratio: new.ratio,
            duration: new.duration,
            task_id: new.task_id,
            status: GenerationStatus::Processing,
            storage_path: None,
            video_url: None,
            thumbnail_path: None,
            error: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        };
        self.insert_video(video.clone());
        Ok(video)
    }

    async fn get_generated_video(&self, user_id: &str, id: Uuid) -> Result<Option<GeneratedVideo>> {
        Ok(self.video(id).filter(|v| v.user_id == user_id))
    }

    async fn get_generated_video_by_task(
        &self,
        user_id: &str,
        task_id: &str,
    ) -> Result<Option<GeneratedVideo>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .generated_videos
            .values()
            .find(|v| v.user_id == user_id && v.task_id == task_id)
            .cloned())
    }

    async fn list_generated_videos(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<Vec<GeneratedVideo>> {
        let tables = self.tables.lock().unwrap();
        let mut videos: Vec<GeneratedVideo> = tables
            .generated_videos
            .values()
            .filter(|v| v.user_id == user_id && v.project_id == Some(project_id))
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    async fn update_generated_video(
        &self,
        user_id: &str,
        id: Uuid,
        update: UpdateGeneratedVideo,
    ) -> Result<Option<GeneratedVideo>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(video) = tables
            .generated_videos
            .get_mut(&id)
            .filter(|v| v.user_id == user_id)
        else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            video.title = Some(title);
        }
        if let Some(prompt) = update.prompt {
            video.prompt = Some(prompt);
        }
        if let Some(status) = update.status {
            video.status = status;
        }
        if let Some(path) = update.storage_path {
            video.storage_path = Some(path);
        }
        if let Some(url) = update.video_url {
            video.video_url = Some(url);
        }
        if let Some(path) = update.thumbnail_path {
            video.thumbnail_path = Some(path);
        }
        if let Some(error) = update.error {
            video.error = Some(error);
        }
        if let Some(metadata) = update.metadata {
            video.metadata = Some(metadata);
        }
        video.updated_at = Utc::now();
        Ok(Some(video.clone()))
    }

    async fn delete_generated_video(&self, user_id: &str, id: Uuid) -> Result<Option<GeneratedVideo>> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .generated_videos
            .get(&id)
            .is_some_and(|v| v.user_id == user_id)
        {
            Ok(tables.generated_videos.remove(&id))
        } else {
            Ok(None)
        }
    }

    async fn ping(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }
}
