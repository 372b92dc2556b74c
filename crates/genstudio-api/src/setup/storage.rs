//! Storage setup and initialization

use anyhow::{Context, Result};
use genstudio_core::Config;
use genstudio_storage::{create_storage, LocalStorage, Storage};
use std::sync::Arc;

/// Build the configured storage backend.
///
/// The local backend is also returned concretely so the API can serve its signed URLs.
pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn Storage>, Option<Arc<LocalStorage>>)> {
    tracing::info!("Initializing storage backend...");

    let configured = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(
        backend = %configured.storage.backend_type(),
        bucket = %config.signed_url_bucket,
        "Storage backend initialized"
    );
    Ok((configured.storage, configured.local))
}
