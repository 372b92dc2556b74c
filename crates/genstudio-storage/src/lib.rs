//! genstudio Storage Library
//!
//! Storage abstraction for generated media plus the signed-URL resolver used to hand out
//! time-limited links to private objects.
//!
//! # Object paths
//!
//! Objects are addressed by `(bucket, path)`. Paths are user-scoped:
//! `{user_id}/{project_id}/{filename}` for uploads and
//! `{user_id}/{project_id}/videos/{video_id}.mp4` for generated videos. Paths must not
//! contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod paths;
pub mod resolver;
#[cfg(feature = "storage-supabase")]
pub mod supabase;
pub mod token;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_storage, ConfiguredStorage};
pub use genstudio_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use paths::{belongs_to_user, generated_video_path, is_storage_path};
pub use resolver::{clamp_expiry, SignedUrlResolver, DEFAULT_BUCKET, DEFAULT_EXPIRY_SECS, MAX_EXPIRY_SECS};
#[cfg(feature = "storage-supabase")]
pub use supabase::SupabaseStorage;
pub use traits::{SignedUrl, Storage, StorageError, StorageResult};
