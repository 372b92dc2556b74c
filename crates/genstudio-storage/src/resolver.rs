//! Signed-URL resolver
//!
//! Walks an arbitrary JSON value and swaps every string that looks like a storage path for
//! a signed URL. Signing failures never fail the walk: the original string stays in place and
//! a warning is logged.

use crate::paths::is_storage_path;
use crate::traits::Storage;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BUCKET: &str = "user-uploads";
pub const DEFAULT_EXPIRY_SECS: u64 = 300;
pub const MAX_EXPIRY_SECS: u64 = 600;

/// Apply a default to a missing or zero expiry and cap it at `max`.
pub fn clamp_expiry(requested: Option<u64>, default: u64, max: u64) -> u64 {
    match requested {
        Some(0) | None => default.min(max),
        Some(secs) => secs.min(max),
    }
}

#[derive(Clone)]
pub struct SignedUrlResolver {
    storage: Arc<dyn Storage>,
    bucket: String,
    expires_in: Duration,
}

impl SignedUrlResolver {
    /// `bucket` defaults to `user-uploads`; `expires_in_secs` defaults to 300 and is capped
    /// at 600.
    pub fn new(storage: Arc<dyn Storage>, bucket: Option<&str>, expires_in_secs: Option<u64>) -> Self {
        Self {
            storage,
            bucket: bucket.unwrap_or(DEFAULT_BUCKET).to_string(),
            expires_in: Duration::from_secs(clamp_expiry(
                expires_in_secs,
                DEFAULT_EXPIRY_SECS,
                MAX_EXPIRY_SECS,
            )),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Replace storage paths anywhere in `value` with signed URLs.
    ///
    /// Each distinct path is signed once per call.
    pub async fn resolve(&self, value: Value) -> Value {
        self.resolve_where(value, |_| true).await
    }

    /// Like `resolve`, but only signs storage paths accepted by `include`. Rejected paths stay
    /// as they are.
    pub async fn resolve_where<F>(&self, value: Value, include: F) -> Value
    where
        F: Fn(&str) -> bool,
    {
        let mut paths = Vec::new();
        let mut seen = HashSet::new();
        collect_paths(&value, &mut paths, &mut seen);
        paths.retain(|p| include(p));
        if paths.is_empty() {
            return value;
        }

        let signed = self.sign_paths(&paths).await;
        replace_paths(value, &signed)
    }

    /// Sign a batch of paths, returning only the ones that succeeded.
    pub async fn sign_paths(&self, paths: &[String]) -> HashMap<String, String> {
        let mut unique = Vec::with_capacity(paths.len());
        let mut seen = HashSet::new();
        for path in paths {
            if !path.is_empty() && seen.insert(path.as_str()) {
                unique.push(path.clone());
            }
        }
        if unique.is_empty() {
            return HashMap::new();
        }

        let results = match self
            .storage
            .create_signed_urls(&self.bucket, &unique, self.expires_in)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    bucket = %self.bucket,
                    count = unique.len(),
                    "Failed to sign storage paths, leaving them unresolved"
                );
                return HashMap::new();
            }
        };

        let mut signed = HashMap::with_capacity(results.len());
        for entry in results {
            match entry.signed_url {
                Some(url) => {
                    signed.insert(entry.path, url);
                }
                None => {
                    tracing::warn!(
                        path = %entry.path,
                        bucket = %self.bucket,
                        error = entry.error.as_deref().unwrap_or("unknown"),
                        "Failed to sign storage path"
                    );
                }
            }
        }
        signed
    }
}

fn collect_paths<'a>(value: &'a Value, out: &mut Vec<String>, seen: &mut HashSet<&'a str>) {
    match value {
        Value::String(s) => {
            if is_storage_path(s) && seen.insert(s.as_str()) {
                out.push(s.clone());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_paths(item, out, seen);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_paths(item, out, seen);
            }
        }
        _ => {}
    }
}

fn replace_paths(value: Value, signed: &HashMap<String, String>) -> Value {
    match value {
        Value::String(s) => match signed.get(&s) {
            Some(url) => Value::String(url.clone()),
            None => Value::String(s),
        },
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| replace_paths(v, signed)).collect())
        }
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, replace_paths(v, signed)))
                .collect(),
        ),
        other => other,
    }
}
