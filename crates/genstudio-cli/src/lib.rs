//! genstudio CLI support: API client, job-status source and output helpers.

pub mod client;

use genstudio_providers::JobSnapshot;

pub use client::{ApiClient, ApiJobSource, Provider};

/// One progress line for a polled job, e.g. `task_1 processing 40%`.
pub fn progress_line(snapshot: &JobSnapshot) -> String {
    let status = serde_json::to_value(snapshot.status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", snapshot.status));
    match snapshot.progress {
        Some(progress) => format!("{} {} {:.0}%", snapshot.id, status, progress),
        None => format!("{} {}", snapshot.id, status),
    }
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays pipeable JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use genstudio_providers::JobStatus;
    use serde_json::Value;

    fn snapshot(status: JobStatus, progress: Option<f64>) -> JobSnapshot {
        JobSnapshot {
            id: "pred_1".to_string(),
            status,
            progress,
            output: Vec::new(),
            error: None,
            raw: Value::Null,
        }
    }

    #[test]
    fn progress_line_includes_percent_when_known() {
        assert_eq!(
            progress_line(&snapshot(JobStatus::Processing, Some(42.4))),
            "pred_1 processing 42%"
        );
        assert_eq!(progress_line(&snapshot(JobStatus::Pending, None)), "pred_1 pending");
    }
}
