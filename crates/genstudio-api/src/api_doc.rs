//! OpenAPI documentation, served at `/api/openapi.json` and rendered by RapiDoc at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ErrorResponse;
use crate::handlers;
use genstudio_core::models;
use genstudio_providers::{JobSnapshot, JobStatus};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Clerk session token"))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "genstudio API",
        version = "0.1.0",
        description = "Image editing (Replicate) and image-to-video generation (Runway) for user projects, with signed URLs for private storage."
    ),
    paths(
        // Replicate
        handlers::replicate::create_prediction,
        handlers::replicate::get_prediction,
        handlers::replicate::cancel_prediction,
        // Runway
        handlers::runway::create_job,
        handlers::runway::get_job,
        handlers::runway::cancel_job,
        // Storage
        handlers::signed_urls::create_signed_urls,
        handlers::signed_urls::create_external_signed_urls,
        // Records
        handlers::generated_videos::get_generated_video,
        handlers::generated_videos::update_generated_video,
        handlers::generated_videos::delete_generated_video,
        handlers::generated_videos::list_project_videos,
        handlers::media_assets::list_project_assets,
    ),
    components(schemas(
        ErrorResponse,
        JobSnapshot,
        JobStatus,
        handlers::JobResponse,
        handlers::replicate::CreatePredictionRequest,
        handlers::runway::CreateVideoJobRequest,
        handlers::signed_urls::SignedUrlsRequest,
        handlers::signed_urls::SignedUrlsResponse,
        handlers::signed_urls::ExternalSignedUrlsRequest,
        models::EditImageRequest,
        models::GenerateVideoRequest,
        models::GeneratedVideo,
        models::UpdateGeneratedVideo,
        models::GenerationStatus,
        models::MediaAsset,
        models::MediaKind,
        models::EditedImage,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "replicate", description = "Image edits via Replicate predictions"),
        (name = "runway", description = "Image-to-video via Runway tasks"),
        (name = "storage", description = "Signed URLs for private objects"),
        (name = "generated-videos", description = "Generated video records"),
        (name = "media-assets", description = "Uploaded media of a project")
    )
)]
pub struct ApiDoc;
