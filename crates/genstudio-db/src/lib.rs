//! genstudio database layer
//!
//! sqlx/Postgres repositories for projects, media assets, lineages and generation records,
//! plus the `GenerationStore` trait the API depends on.

pub mod db;

pub use db::{
    EditedImageRepository, GeneratedVideoRepository, GenerationStore, LineageRepository,
    MediaAssetRepository, PgGenerationStore, ProjectRepository,
};
