//! Job poller
//!
//! Repeatedly asks a provider for a job's state on a fixed interval until the job reaches a
//! terminal state or the attempt budget runs out. No backoff or jitter. Dropping the future
//! stops polling.

use crate::error::ProviderError;
use crate::status::{JobSnapshot, JobStatus};
use async_trait::async_trait;
use genstudio_core::AppError;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
pub const REPLICATE_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const RUNWAY_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Anything that can report the current state of a job by id.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> Result<JobSnapshot, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollConfig {
    pub fn replicate() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: REPLICATE_POLL_INTERVAL,
        }
    }

    pub fn runway() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: RUNWAY_POLL_INTERVAL,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::replicate()
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Job {job_id} failed: {message}")]
    Failed { job_id: String, message: String },

    #[error("Job {job_id} was canceled")]
    Canceled { job_id: String },

    #[error("Job {job_id} did not finish after {attempts} attempts")]
    TimedOut { job_id: String, attempts: u32 },

    #[error(transparent)]
    Fetch(#[from] ProviderError),
}

impl From<PollError> for AppError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::Failed { message, .. } => AppError::GenerationFailed(message),
            PollError::Canceled { job_id } => {
                AppError::GenerationCanceled(format!("Job {} was canceled", job_id))
            }
            timeout @ PollError::TimedOut { .. } => AppError::GenerationTimeout(timeout.to_string()),
            PollError::Fetch(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JobPoller {
    config: PollConfig,
}

impl JobPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Poll `job_id` until it succeeds, fails, is canceled or the attempt budget is spent.
    ///
    /// `on_progress` sees every snapshot, including the first and the terminal one.
    #[tracing::instrument(skip(self, source, on_progress), fields(max_attempts = self.config.max_attempts))]
    pub async fn poll<S, F>(
        &self,
        source: &S,
        job_id: &str,
        mut on_progress: F,
    ) -> Result<JobSnapshot, PollError>
    where
        S: JobStatusSource + ?Sized,
        F: FnMut(&JobSnapshot) + Send,
    {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let snapshot = source.fetch_status(job_id).await?;
            on_progress(&snapshot);

            match snapshot.status {
                JobStatus::Succeeded => {
                    tracing::info!(job_id = %job_id, attempts = attempt, "Job completed successfully");
                    return Ok(snapshot);
                }
                JobStatus::Failed => {
                    let message = snapshot
                        .error
                        .filter(|e| !e.trim().is_empty())
                        .unwrap_or_else(|| "Unknown error".to_string());
                    tracing::warn!(job_id = %job_id, attempts = attempt, error = %message, "Job failed");
                    return Err(PollError::Failed {
                        job_id: job_id.to_string(),
                        message,
                    });
                }
                JobStatus::Canceled => {
                    tracing::info!(job_id = %job_id, attempts = attempt, "Job was canceled");
                    return Err(PollError::Canceled {
                        job_id: job_id.to_string(),
                    });
                }
                JobStatus::Pending | JobStatus::Processing => {
                    tracing::debug!(
                        job_id = %job_id,
                        attempt,
                        status = ?snapshot.status,
                        progress = ?snapshot.progress,
                        "Waiting for job to complete"
                    );
                    if attempt < max_attempts {
                        sleep(self.config.interval).await;
                    }
                }
            }
        }

        tracing::warn!(job_id = %job_id, attempts = max_attempts, "Job polling timed out");
        Err(PollError::TimedOut {
            job_id: job_id.to_string(),
            attempts: max_attempts,
        })
    }
}
