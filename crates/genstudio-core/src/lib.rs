//! genstudio Core Library
//!
//! This crate provides core domain models, error types, configuration, request validation
//! and provider error normalization shared across all genstudio components.

pub mod config;
pub mod error;
pub mod error_message;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, PollSettings};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use error_message::{extract_error_message, status_code_from_error};
pub use storage_types::StorageBackend;
pub use validation::ValidationResult;
