//! genstudio provider clients
//!
//! HTTP clients for the Replicate and Runway generation APIs, a provider-neutral view of a
//! job's state, and the poller that waits for a job to finish.

pub mod error;
mod http;
pub mod poller;
pub mod replicate;
pub mod runway;
pub mod status;

pub use error::ProviderError;
pub use poller::{JobPoller, JobStatusSource, PollConfig, PollError};
pub use replicate::ReplicateClient;
pub use runway::RunwayClient;
pub use status::{JobSnapshot, JobStatus};
