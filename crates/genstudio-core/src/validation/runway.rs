use super::{is_media_reference, ValidationResult};
use crate::models::{GenerateVideoRequest, RunwayModel};
use validator::Validate;

pub const RUNWAY_DURATIONS: &[i64] = &[5, 10];

/// Validate an image-to-video request before it is sent to Runway.
pub fn validate_generate_video_request(request: &GenerateVideoRequest) -> ValidationResult {
    match request.prompt_image.as_deref().map(str::trim) {
        None | Some("") => return ValidationResult::invalid("prompt_image is required"),
        Some(image) if image.starts_with("data:image/") => {}
        Some(image) if !is_media_reference(image) => {
            return ValidationResult::invalid(
                "prompt_image must be an http(s) URL, a storage path or a data:image URI",
            )
        }
        Some(_) => {}
    }

    if let Err(errors) = request.validate() {
        return errors.into();
    }

    let model = match request.model.as_deref() {
        Some(name) => match name.parse::<RunwayModel>() {
            Ok(model) => model,
            Err(message) => return ValidationResult::invalid(message),
        },
        None => RunwayModel::default(),
    };

    match request.ratio.as_deref() {
        None => return ValidationResult::invalid("ratio is required"),
        Some(ratio) if !model.allowed_ratios().contains(&ratio) => {
            return ValidationResult::invalid(format!(
                "Invalid ratio '{}' for {}. Must be one of: {}",
                ratio,
                model.as_str(),
                model.allowed_ratios().join(", ")
            ))
        }
        Some(_) => {}
    }

    if let Some(duration) = request.duration {
        if !RUNWAY_DURATIONS.contains(&duration) {
            return ValidationResult::invalid("duration must be 5 or 10 seconds");
        }
    }

    ValidationResult::ok()
}
