use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

/// Lifecycle of a generation request as persisted in our database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "generation_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationStatus::Succeeded | GenerationStatus::Failed | GenerationStatus::Canceled
        )
    }
}

impl Display for GenerationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::Processing => "processing",
            GenerationStatus::Succeeded => "succeeded",
            GenerationStatus::Failed => "failed",
            GenerationStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// Image edit request forwarded to Replicate.
///
/// Fields are optional at the type level so that missing values are reported by
/// `validation::validate_edit_image_request` instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct EditImageRequest {
    /// Edit instruction
    #[validate(length(max = 2000, message = "prompt must be at most 2000 characters"))]
    pub prompt: Option<String>,
    /// Absolute URL or bucket-relative storage path of the source image
    pub input_image: Option<String>,
    pub aspect_ratio: Option<String>,
    pub output_format: Option<String>,
    /// 0 (strict) to 6 (permissive)
    #[validate(range(min = 0, max = 6, message = "safety_tolerance must be between 0 and 6"))]
    pub safety_tolerance: Option<i64>,
    #[validate(range(min = 0, message = "seed must be a non-negative integer"))]
    pub seed: Option<i64>,
    pub prompt_upsampling: Option<bool>,
}

/// Image-to-video request forwarded to Runway.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct GenerateVideoRequest {
    /// Absolute URL, storage path or `data:image/...` URI of the first frame
    pub prompt_image: Option<String>,
    #[validate(length(max = 1000, message = "prompt_text must be at most 1000 characters"))]
    pub prompt_text: Option<String>,
    /// `gen4_turbo` (default) or `gen3a_turbo`
    pub model: Option<String>,
    /// Output resolution as `W:H`, e.g. `1280:720`
    pub ratio: Option<String>,
    /// Seconds, 5 or 10
    pub duration: Option<i64>,
    #[validate(range(min = 0i64, max = 4294967295i64, message = "seed must be between 0 and 4294967295"))]
    pub seed: Option<i64>,
}

/// Runway video models we accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunwayModel {
    #[default]
    Gen4Turbo,
    Gen3aTurbo,
}

impl RunwayModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunwayModel::Gen4Turbo => "gen4_turbo",
            RunwayModel::Gen3aTurbo => "gen3a_turbo",
        }
    }

    pub fn allowed_ratios(&self) -> &'static [&'static str] {
        match self {
            RunwayModel::Gen4Turbo => &[
                "1280:720", "720:1280", "1104:832", "832:1104", "960:960", "1584:672",
            ],
            RunwayModel::Gen3aTurbo => &["1280:768", "768:1280"],
        }
    }
}

impl FromStr for RunwayModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gen4_turbo" => Ok(RunwayModel::Gen4Turbo),
            "gen3a_turbo" => Ok(RunwayModel::Gen3aTurbo),
            other => Err(format!(
                "Invalid model '{}'. Must be one of: gen4_turbo, gen3a_turbo",
                other
            )),
        }
    }
}

impl GenerateVideoRequest {
    /// Model with the default applied. Invalid names fall back to the default; callers
    /// validate first.
    pub fn resolved_model(&self) -> RunwayModel {
        self.model
            .as_deref()
            .and_then(|m| m.parse().ok())
            .unwrap_or_default()
    }

    pub fn resolved_duration(&self) -> i64 {
        self.duration.unwrap_or(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(GenerationStatus::Succeeded.is_terminal());
        assert!(GenerationStatus::Failed.is_terminal());
        assert!(GenerationStatus::Canceled.is_terminal());
        assert!(!GenerationStatus::Pending.is_terminal());
        assert!(!GenerationStatus::Processing.is_terminal());
    }

    #[test]
    fn video_request_defaults() {
        let request = GenerateVideoRequest::default();
        assert_eq!(request.resolved_model(), RunwayModel::Gen4Turbo);
        assert_eq!(request.resolved_duration(), 5);
    }

    #[test]
    fn runway_model_parsing() {
        assert_eq!(
            "gen3a_turbo".parse::<RunwayModel>().unwrap(),
            RunwayModel::Gen3aTurbo
        );
        assert!("gen2".parse::<RunwayModel>().is_err());
    }
}
