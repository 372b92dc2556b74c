//! Application state shared by all handlers.

use crate::auth::TokenVerifier;
use genstudio_core::Config;
use genstudio_db::GenerationStore;
use genstudio_providers::{JobPoller, PollConfig, ReplicateClient, RunwayClient};
use genstudio_storage::{LocalStorage, SignedUrlResolver, Storage};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn GenerationStore>,
    pub storage: Arc<dyn Storage>,
    /// Set when the local filesystem backend is active; serves `/storage/local/...`.
    pub local_storage: Option<Arc<LocalStorage>>,
    pub replicate: ReplicateClient,
    pub runway: RunwayClient,
    pub auth: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn replicate_poller(&self) -> JobPoller {
        JobPoller::new(PollConfig {
            max_attempts: self.config.poll.max_attempts,
            interval: self.config.poll.replicate_interval,
        })
    }

    pub fn runway_poller(&self) -> JobPoller {
        JobPoller::new(PollConfig {
            max_attempts: self.config.poll.max_attempts,
            interval: self.config.poll.runway_interval,
        })
    }

    /// Resolver over the user-uploads bucket with the default expiry.
    pub fn resolver(&self) -> SignedUrlResolver {
        self.resolver_for(&self.config.signed_url_bucket, None)
    }

    pub fn resolver_for(&self, bucket: &str, expires_in_secs: Option<u64>) -> SignedUrlResolver {
        SignedUrlResolver::new(self.storage.clone(), Some(bucket), expires_in_secs)
    }
}
