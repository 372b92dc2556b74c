//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::auth::{ClerkJwtVerifier, TokenVerifier};
use crate::state::AppState;
use anyhow::{Context, Result};
use genstudio_core::Config;
use genstudio_db::PgGenerationStore;
use genstudio_providers::{ReplicateClient, RunwayClient};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;
    let store = Arc::new(PgGenerationStore::new(pool));

    let (storage, local_storage) = storage::setup_storage(&config).await?;

    let replicate = ReplicateClient::new(config.replicate_api_token.clone())
        .context("Failed to build Replicate client")?
        .with_base_url(config.replicate_base_url.clone())
        .with_image_model(config.replicate_image_model.clone());
    let runway = RunwayClient::new(config.runway_api_key.clone())
        .context("Failed to build Runway client")?
        .with_base_url(config.runway_base_url.clone());

    let auth: Arc<dyn TokenVerifier> = Arc::new(
        ClerkJwtVerifier::new(config.clerk_jwks_url.clone(), config.clerk_issuer.clone())
            .context("Failed to build session token verifier")?,
    );

    let state = Arc::new(AppState {
        config,
        store,
        storage,
        local_storage,
        replicate,
        runway,
        auth,
    });

    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}
