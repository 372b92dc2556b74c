//! genstudio HTTP API
//!
//! Axum service that fronts Replicate image edits and Runway image-to-video tasks for
//! authenticated users, persists generation records, and signs URLs for private storage.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
