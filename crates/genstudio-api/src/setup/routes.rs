//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::auth::middleware::auth_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use genstudio_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Build the full router: public probes and docs, authenticated API routes, and the
/// shared middleware stack.
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(&state.config)?;

    let protected_routes = protected_routes().layer(axum::middleware::from_fn_with_state(
        state.auth.clone(),
        auth_middleware,
    ));

    let http_concurrency_limit = state.config.http_concurrency_limit.max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let app = public_routes(&state)
        .merge(protected_routes)
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn public_routes(state: &AppState) -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/live", get(handlers::health::liveness_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));

    if state.local_storage.is_some() {
        router.route(
            "/storage/local/{bucket}/{*path}",
            get(handlers::local_files::serve_local_file),
        )
    } else {
        router
    }
}

fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/replicate/predictions",
            post(handlers::replicate::create_prediction),
        )
        .route(
            "/api/replicate/predictions/{id}",
            get(handlers::replicate::get_prediction),
        )
        .route(
            "/api/replicate/predictions/{id}/cancel",
            post(handlers::replicate::cancel_prediction),
        )
        .route("/api/runway/jobs", post(handlers::runway::create_job))
        .route(
            "/api/runway/jobs/{id}",
            get(handlers::runway::get_job).delete(handlers::runway::cancel_job),
        )
        .route(
            "/api/signed-urls",
            post(handlers::signed_urls::create_signed_urls),
        )
        .route(
            "/api/signed-urls/external",
            post(handlers::signed_urls::create_external_signed_urls),
        )
        .route(
            "/api/generated-videos/{id}",
            get(handlers::generated_videos::get_generated_video)
                .patch(handlers::generated_videos::update_generated_video)
                .delete(handlers::generated_videos::delete_generated_video),
        )
        .route(
            "/api/projects/{id}/generated-videos",
            get(handlers::generated_videos::list_project_videos),
        )
        .route(
            "/api/projects/{id}/media-assets",
            get(handlers::media_assets::list_project_assets),
        )
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
