//! Domain models
//!
//! Records owned by the managed Postgres backend plus the request/response shapes
//! exchanged with API clients.

pub mod edited_image;
pub mod generated_video;
pub mod generation;
pub mod lineage;
pub mod media_asset;
pub mod project;

pub use edited_image::{EditedImage, NewEditedImage};
pub use generated_video::{GeneratedVideo, NewGeneratedVideo, UpdateGeneratedVideo};
pub use generation::{EditImageRequest, GenerateVideoRequest, GenerationStatus, RunwayModel};
pub use lineage::Lineage;
pub use media_asset::{MediaAsset, MediaKind};
pub use project::Project;
