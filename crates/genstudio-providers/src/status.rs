use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Provider-neutral job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled
        )
    }
}

impl From<JobStatus> for genstudio_core::models::GenerationStatus {
    fn from(status: JobStatus) -> Self {
        use genstudio_core::models::GenerationStatus;
        match status {
            JobStatus::Pending => GenerationStatus::Pending,
            JobStatus::Processing => GenerationStatus::Processing,
            JobStatus::Succeeded => GenerationStatus::Succeeded,
            JobStatus::Failed => GenerationStatus::Failed,
            JobStatus::Canceled => GenerationStatus::Canceled,
        }
    }
}

/// One observation of a provider job.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    /// Percent complete (0..=100) when the provider reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default)]
    pub output: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Provider response as received.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub raw: Value,
}

impl JobSnapshot {
    pub fn first_output(&self) -> Option<&str> {
        self.output.first().map(String::as_str)
    }
}

/// Normalize a provider `output` field (string, array of strings, or null).
pub(crate) fn output_urls(output: Option<&Value>) -> Vec<String> {
    match output {
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Canceled.is_terminal());
    }

    #[test]
    fn output_normalization() {
        assert_eq!(output_urls(Some(&json!("https://x/a.png"))), vec!["https://x/a.png"]);
        assert_eq!(
            output_urls(Some(&json!(["https://x/a.mp4", 3, "https://x/b.mp4"]))),
            vec!["https://x/a.mp4", "https://x/b.mp4"]
        );
        assert!(output_urls(Some(&Value::Null)).is_empty());
        assert!(output_urls(None).is_empty());
    }
}
