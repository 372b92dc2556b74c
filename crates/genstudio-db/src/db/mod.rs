//! Database repositories for data access layer
//!
//! Every query is scoped by the owning user id, so a record owned by someone else reads the
//! same as a missing one.

pub mod edited_image;
pub mod generated_video;
pub mod lineage;
pub mod media_asset;
pub mod project;
pub mod store;

pub use edited_image::EditedImageRepository;
pub use generated_video::GeneratedVideoRepository;
pub use lineage::LineageRepository;
pub use media_asset::MediaAssetRepository;
pub use project::ProjectRepository;
pub use store::{GenerationStore, PgGenerationStore};
