use super::{is_media_reference, ValidationResult};
use crate::models::EditImageRequest;
use validator::Validate;

pub const REPLICATE_ASPECT_RATIOS: &[&str] = &[
    "match_input_image",
    "1:1",
    "16:9",
    "9:16",
    "4:3",
    "3:4",
    "3:2",
    "2:3",
    "4:5",
    "5:4",
    "21:9",
    "9:21",
    "2:1",
    "1:2",
];
pub const REPLICATE_OUTPUT_FORMATS: &[&str] = &["jpg", "png"];

/// Validate an image edit request before it is sent to Replicate.
///
/// Presence and membership rules are checked here; length and range rules live on the
/// `Validate` derive of `EditImageRequest`.
pub fn validate_edit_image_request(request: &EditImageRequest) -> ValidationResult {
    let prompt = request.prompt.as_deref().map(str::trim).unwrap_or_default();
    if prompt.is_empty() {
        return ValidationResult::invalid("prompt is required");
    }

    match request.input_image.as_deref() {
        None => return ValidationResult::invalid("input_image is required"),
        Some(image) if !is_media_reference(image) => {
            return ValidationResult::invalid(
                "input_image must be an http(s) URL or a storage path",
            )
        }
        Some(_) => {}
    }

    if let Err(errors) = request.validate() {
        return errors.into();
    }

    if let Some(ratio) = request.aspect_ratio.as_deref() {
        if !REPLICATE_ASPECT_RATIOS.contains(&ratio) {
            return ValidationResult::invalid(format!(
                "Invalid aspect_ratio '{}'. Must be one of: {}",
                ratio,
                REPLICATE_ASPECT_RATIOS.join(", ")
            ));
        }
    }

    if let Some(format) = request.output_format.as_deref() {
        if !REPLICATE_OUTPUT_FORMATS.contains(&format) {
            return ValidationResult::invalid(format!(
                "Invalid output_format '{}'. Must be one of: {}",
                format,
                REPLICATE_OUTPUT_FORMATS.join(", ")
            ));
        }
    }

    ValidationResult::ok()
}
