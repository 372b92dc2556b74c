//! Handler-facing helpers that combine the store, storage and provider clients.

pub mod generation;
pub mod references;
