//! Provider request validation
//!
//! Validators are shallow, rule-based checks run before a request is forwarded to a
//! provider. They report problems as a `ValidationResult` instead of an error so callers
//! can turn them into 400 responses with details.

pub mod replicate;
pub mod runway;

pub use replicate::{validate_edit_image_request, REPLICATE_ASPECT_RATIOS, REPLICATE_OUTPUT_FORMATS};
pub use runway::{validate_generate_video_request, RUNWAY_DURATIONS};

use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(message.into()),
        }
    }

    /// Convert into a `Result`, mapping failures to `AppError::InvalidInput`.
    pub fn into_result(self) -> Result<(), crate::AppError> {
        if self.valid {
            Ok(())
        } else {
            Err(crate::AppError::InvalidInput(
                self.error
                    .unwrap_or_else(|| "Invalid request".to_string()),
            ))
        }
    }
}

impl From<ValidationErrors> for ValidationResult {
    /// Reports the first failing field in name order so the message is stable.
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .into_iter()
            .find_map(|(field, field_errors)| {
                field_errors.first().map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .unwrap_or_else(|| "Invalid request".to_string());
        ValidationResult::invalid(message)
    }
}

pub fn is_absolute_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Accepts absolute URLs and bucket-relative keys. Keys may not be rooted or escape
/// the bucket.
pub(crate) fn is_media_reference(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    if is_absolute_url(value) {
        return true;
    }
    !value.starts_with('/') && !value.split('/').any(|segment| segment == "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_reference_rules() {
        assert!(is_media_reference("https://cdn.example.com/a.png"));
        assert!(is_media_reference("user_1/project/a.png"));
        assert!(!is_media_reference(""));
        assert!(!is_media_reference("/etc/passwd"));
        assert!(!is_media_reference("user_1/../secret.png"));
        assert!(!is_media_reference("has space.png"));
    }

    #[test]
    fn field_errors_use_their_message() {
        use validator::ValidationError;

        let mut errors = ValidationErrors::new();
        errors.add(
            "seed",
            ValidationError::new("range").with_message("seed must be positive".into()),
        );
        errors.add("prompt", ValidationError::new("length"));

        let result = ValidationResult::from(errors);
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("prompt is invalid"));
    }

    #[test]
    fn into_result_maps_to_invalid_input() {
        assert!(ValidationResult::ok().into_result().is_ok());
        let err = ValidationResult::invalid("prompt is required")
            .into_result()
            .unwrap_err();
        assert!(matches!(err, crate::AppError::InvalidInput(msg) if msg == "prompt is required"));
    }
}
