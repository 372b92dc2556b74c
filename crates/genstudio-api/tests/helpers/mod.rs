//! Test helpers: build AppState and router for integration tests.
//!
//! The database is replaced by `MemoryStore`, storage is the local backend in a temp dir and
//! both providers point at a mockito server.

#![allow(dead_code)]

pub mod store;

use axum_test::TestServer;
use genstudio_api::auth::{SharedSecretVerifier, TokenVerifier};
use genstudio_api::setup::{routes, storage};
use genstudio_api::state::AppState;
use genstudio_core::Config;
use genstudio_providers::{ReplicateClient, RunwayClient};
use std::collections::HashMap;
use std::sync::Arc;
use store::MemoryStore;
use tempfile::TempDir;

pub const USER_ID: &str = "user_2test";
pub const OTHER_USER_ID: &str = "user_2other";
pub const UPLOADS_BUCKET: &str = "user-uploads";
pub const LOCAL_BASE_URL: &str = "http://localhost:4000";
const SESSION_SECRET: &[u8] = b"integration-test-session-secret";
const SIGNING_SECRET: &str = "0123456789abcdef0123456789abcdef";

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub providers: mockito::ServerGuard,
    tokens: SharedSecretVerifier,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// `Authorization` header value for `user_id`.
    pub fn bearer(&self, user_id: &str) -> String {
        let token = self.tokens.issue(user_id, 3600).unwrap();
        format!("Bearer {}", token)
    }

    pub fn storage_root(&self) -> &std::path::Path {
        self._temp_dir.path()
    }
}

fn test_config(temp_dir: &TempDir, provider_url: &str) -> Config {
    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("DATABASE_URL", "postgres://localhost/genstudio_test".to_string());
    vars.insert("STORAGE_BACKEND", "local".to_string());
    vars.insert(
        "LOCAL_STORAGE_PATH",
        temp_dir.path().to_string_lossy().into_owned(),
    );
    vars.insert("LOCAL_STORAGE_BASE_URL", LOCAL_BASE_URL.to_string());
    vars.insert("LOCAL_STORAGE_SIGNING_SECRET", SIGNING_SECRET.to_string());
    vars.insert("REPLICATE_API_TOKEN", "r8_test".to_string());
    vars.insert("REPLICATE_BASE_URL", provider_url.to_string());
    vars.insert("RUNWAY_API_KEY", "key_test".to_string());
    vars.insert("RUNWAY_BASE_URL", provider_url.to_string());
    vars.insert("REPLICATE_POLL_INTERVAL_SECS", "0".to_string());
    vars.insert("RUNWAY_POLL_INTERVAL_SECS", "0".to_string());
    vars.insert("POLL_MAX_ATTEMPTS", "3".to_string());
    vars.insert("CLERK_JWKS_URL", "http://localhost:1/.well-known/jwks.json".to_string());
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

/// Setup test app with an in-memory store, local storage and mocked providers.
pub async fn setup_test_app() -> TestApp {
    let providers = mockito::Server::new_async().await;
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir, &providers.url());

    let (storage, local_storage) = storage::setup_storage(&config).await.unwrap();
    let store = Arc::new(MemoryStore::default());
    let tokens = SharedSecretVerifier::new(SESSION_SECRET, None);
    let auth: Arc<dyn TokenVerifier> = Arc::new(SharedSecretVerifier::new(SESSION_SECRET, None));

    let replicate = ReplicateClient::new(config.replicate_api_token.clone())
        .unwrap()
        .with_base_url(config.replicate_base_url.clone())
        .with_image_model(config.replicate_image_model.clone());
    let runway = RunwayClient::new(config.runway_api_key.clone())
        .unwrap()
        .with_base_url(config.runway_base_url.clone());

    let state = Arc::new(AppState {
        config,
        store: store.clone(),
        storage,
        local_storage,
        replicate,
        runway,
        auth,
    });

    let router = routes::setup_routes(state.clone()).unwrap();
    let server = TestServer::new(router).unwrap();

    TestApp {
        server,
        state,
        store,
        providers,
        tokens,
        _temp_dir: temp_dir,
    }
}

/// Split a local signed URL into its route path and token.
pub fn split_signed_url(url: &str) -> (String, String) {
    let relative = url
        .strip_prefix(LOCAL_BASE_URL)
        .expect("signed URL should use the local base URL");
    let (path, token) = relative
        .split_once("?token=")
        .expect("signed URL should carry a token");
    (path.to_string(), token.to_string())
}

/// A finished generated video stored under the owner's prefix.
pub fn stored_video(
    user_id: &str,
    project_id: uuid::Uuid,
) -> genstudio_core::models::GeneratedVideo {
    let id = uuid::Uuid::new_v4();
    let now = chrono::Utc::now();
    genstudio_core::models::GeneratedVideo {
        id,
        user_id: user_id.to_string(),
        project_id: Some(project_id),
        source_asset_id: None,
        lineage_id: None,
        title: None,
        prompt: Some("waves at dusk".to_string()),
        model: "gen4_turbo".to_string(),
        ratio: "1280:720".to_string(),
        duration: 5,
        task_id: format!("task_{}", id.simple()),
        status: genstudio_core::models::GenerationStatus::Succeeded,
        storage_path: Some(format!("{}/{}/videos/{}.mp4", user_id, project_id, id)),
        video_url: Some("https://dnznrvs05pmza.cloudfront.net/out.mp4".to_string()),
        thumbnail_path: None,
        error: None,
        metadata: None,
        created_at: now,
        updated_at: now,
    }
}
