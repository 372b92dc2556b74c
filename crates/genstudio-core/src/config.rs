//! Configuration module
//!
//! Runtime configuration for the API server, read from the environment (and `.env` via
//! dotenvy in the binary). Provider credentials and the database URL are required; the rest
//! falls back to defaults.

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const HTTP_CONCURRENCY_LIMIT: usize = 256;
const DEFAULT_SIGNED_URL_BUCKET: &str = "user-uploads";
const DEFAULT_EXTERNAL_BUCKETS: &str = "user-uploads,generated-videos";
const DEFAULT_REPLICATE_BASE_URL: &str = "https://api.replicate.com/v1";
const DEFAULT_REPLICATE_IMAGE_MODEL: &str = "black-forest-labs/flux-kontext-pro";
const DEFAULT_RUNWAY_BASE_URL: &str = "https://api.dev.runwayml.com/v1";
const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 60;
const DEFAULT_REPLICATE_POLL_INTERVAL_SECS: u64 = 2;
const DEFAULT_RUNWAY_POLL_INTERVAL_SECS: u64 = 5;

/// Polling limits applied when the API waits on a provider job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub replicate_interval: Duration,
    pub runway_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            replicate_interval: Duration::from_secs(DEFAULT_REPLICATE_POLL_INTERVAL_SECS),
            runway_interval: Duration::from_secs(DEFAULT_RUNWAY_POLL_INTERVAL_SECS),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub http_concurrency_limit: usize,
    pub log_format: Option<String>,

    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,

    pub storage_backend: StorageBackend,
    pub supabase_url: Option<String>,
    pub supabase_service_role_key: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_storage_signing_secret: Option<String>,
    pub signed_url_bucket: String,
    pub external_signed_url_buckets: Vec<String>,

    pub replicate_api_token: String,
    pub replicate_base_url: String,
    pub replicate_image_model: String,
    pub runway_api_key: String,
    pub runway_base_url: String,
    pub poll: PollSettings,

    pub clerk_jwks_url: String,
    pub clerk_issuer: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let storage_backend = match get("STORAGE_BACKEND") {
            Some(value) => value
                .parse::<StorageBackend>()
                .map_err(|e| anyhow::anyhow!("STORAGE_BACKEND: {}", e))?,
            None => StorageBackend::Supabase,
        };

        let poll = PollSettings {
            max_attempts: parse_or(&get, "POLL_MAX_ATTEMPTS", DEFAULT_POLL_MAX_ATTEMPTS)?,
            replicate_interval: Duration::from_secs(parse_or(
                &get,
                "REPLICATE_POLL_INTERVAL_SECS",
                DEFAULT_REPLICATE_POLL_INTERVAL_SECS,
            )?),
            runway_interval: Duration::from_secs(parse_or(
                &get,
                "RUNWAY_POLL_INTERVAL_SECS",
                DEFAULT_RUNWAY_POLL_INTERVAL_SECS,
            )?),
        };

        let config = Config {
            server_port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            environment: get("ENVIRONMENT")
                .or_else(|| get("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            cors_origins: split_list(&get("CORS_ORIGINS").unwrap_or_else(|| "*".to_string())),
            http_concurrency_limit: parse_or(&get, "HTTP_CONCURRENCY_LIMIT", HTTP_CONCURRENCY_LIMIT)?,
            log_format: get("LOG_FORMAT"),

            database_url: required("DATABASE_URL")?,
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_or(&get, "DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS)?,

            storage_backend,
            supabase_url: get("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            supabase_service_role_key: get("SUPABASE_SERVICE_ROLE_KEY"),
            local_storage_path: get("LOCAL_STORAGE_PATH"),
            local_storage_base_url: get("LOCAL_STORAGE_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string()),
            local_storage_signing_secret: get("LOCAL_STORAGE_SIGNING_SECRET"),
            signed_url_bucket: get("SIGNED_URL_BUCKET")
                .unwrap_or_else(|| DEFAULT_SIGNED_URL_BUCKET.to_string()),
            external_signed_url_buckets: split_list(
                &get("EXTERNAL_SIGNED_URL_BUCKETS")
                    .unwrap_or_else(|| DEFAULT_EXTERNAL_BUCKETS.to_string()),
            ),

            replicate_api_token: required("REPLICATE_API_TOKEN")?,
            replicate_base_url: get("REPLICATE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_REPLICATE_BASE_URL.to_string()),
            replicate_image_model: get("REPLICATE_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_REPLICATE_IMAGE_MODEL.to_string()),
            runway_api_key: required("RUNWAY_API_KEY")?,
            runway_base_url: get("RUNWAY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_RUNWAY_BASE_URL.to_string()),
            poll,

            clerk_jwks_url: required("CLERK_JWKS_URL")?,
            clerk_issuer: get("CLERK_ISSUER"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        matches!(
            self.environment.to_lowercase().as_str(),
            "production" | "prod"
        )
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.database_url.starts_with("postgres://")
            || self.database_url.starts_with("postgresql://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        for (name, url) in [
            ("REPLICATE_BASE_URL", self.replicate_base_url.as_str()),
            ("RUNWAY_BASE_URL", self.runway_base_url.as_str()),
            ("CLERK_JWKS_URL", self.clerk_jwks_url.as_str()),
        ] {
            if !is_http_url(url) {
                return Err(anyhow::anyhow!("{} must be an http(s) URL", name));
            }
        }

        if self.poll.max_attempts == 0 {
            return Err(anyhow::anyhow!("POLL_MAX_ATTEMPTS must be at least 1"));
        }

        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be at least 1"));
        }

        if self.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be at least 1"));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production; list the allowed origins"
            ));
        }

        match self.storage_backend {
            StorageBackend::Supabase => {
                match self.supabase_url.as_deref() {
                    None => {
                        return Err(anyhow::anyhow!(
                            "SUPABASE_URL must be set when using the supabase storage backend"
                        ))
                    }
                    Some(url) if !is_http_url(url) => {
                        return Err(anyhow::anyhow!("SUPABASE_URL must be an http(s) URL"))
                    }
                    Some(_) => {}
                }
                if self.supabase_service_role_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "SUPABASE_SERVICE_ROLE_KEY must be set when using the supabase storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
                match self.local_storage_signing_secret.as_deref() {
                    Some(secret) if secret.len() >= 32 => {}
                    _ => {
                        return Err(anyhow::anyhow!(
                            "LOCAL_STORAGE_SIGNING_SECRET must be at least 32 characters long"
                        ))
                    }
                }
            }
        }

        Ok(())
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, value, e)),
        None => Ok(default),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/genstudio"),
            ("SUPABASE_URL", "https://project.supabase.co/"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-role-key"),
            ("REPLICATE_API_TOKEN", "r8_token"),
            ("RUNWAY_API_KEY", "key_runway"),
            ("CLERK_JWKS_URL", "https://clerk.example.com/.well-known/jwks.json"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config, anyhow::Error> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_are_applied() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.server_port, 4000);
        assert_eq!(config.storage_backend, StorageBackend::Supabase);
        assert_eq!(config.supabase_url.as_deref(), Some("https://project.supabase.co"));
        assert_eq!(config.signed_url_bucket, "user-uploads");
        assert_eq!(
            config.external_signed_url_buckets,
            vec!["user-uploads".to_string(), "generated-videos".to_string()]
        );
        assert_eq!(config.replicate_image_model, "black-forest-labs/flux-kontext-pro");
        assert_eq!(config.poll, PollSettings::default());
        assert!(!config.is_production());
    }

    #[test]
    fn missing_required_variable_is_fatal() {
        let mut env = base_env();
        env.remove("REPLICATE_API_TOKEN");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("REPLICATE_API_TOKEN"));
    }

    #[test]
    fn supabase_backend_requires_credentials() {
        let mut env = base_env();
        env.remove("SUPABASE_SERVICE_ROLE_KEY");
        assert!(load(&env).is_err());
    }

    #[test]
    fn local_backend_requires_signing_secret() {
        let mut env = base_env();
        env.insert("STORAGE_BACKEND", "local");
        env.insert("LOCAL_STORAGE_PATH", "/tmp/genstudio");
        env.insert("LOCAL_STORAGE_BASE_URL", "http://localhost:4000");
        assert!(load(&env).is_err());

        env.insert("LOCAL_STORAGE_SIGNING_SECRET", "0123456789abcdef0123456789abcdef");
        let config = load(&env).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Local);
    }

    #[test]
    fn wildcard_cors_rejected_in_production() {
        let mut env = base_env();
        env.insert("ENVIRONMENT", "production");
        assert!(load(&env).is_err());

        env.insert("CORS_ORIGINS", "https://app.example.com");
        assert!(load(&env).unwrap().is_production());
    }

    #[test]
    fn poll_settings_are_configurable() {
        let mut env = base_env();
        env.insert("POLL_MAX_ATTEMPTS", "10");
        env.insert("RUNWAY_POLL_INTERVAL_SECS", "1");
        let config = load(&env).unwrap();
        assert_eq!(config.poll.max_attempts, 10);
        assert_eq!(config.poll.runway_interval, Duration::from_secs(1));

        env.insert("POLL_MAX_ATTEMPTS", "many");
        assert!(load(&env).is_err());
    }
}
