//! Environment configuration.
//!
//! Every setting has a default suitable for local development except the
//! API token, which must be set for the jobs API to start.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
pub const DEFAULT_API_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_STORAGE_DIR: &str = "./storage";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Object-storage settings.
///
/// A bucket selects the S3 backend, which signs requests with the region and
/// credentials. Endpoint, bucket and public prefix shape returned URLs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Public URL prefix; takes precedence over endpoint/bucket.
    pub public_url: Option<String>,
    /// Root directory of the local-filesystem backend.
    pub local_dir: PathBuf,
}

impl core::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "<set>"))
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("public_url", &self.public_url)
            .field("local_dir", &self.local_dir)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub redis_url: String,
    pub database_url: Option<String>,
    pub storage: StorageConfig,
    pub api_token: Option<String>,
    pub api_addr: SocketAddr,
    pub worker_poll_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_addr = get("JOBS_API_ADDR")
            .unwrap_or_else(|| DEFAULT_API_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "JOBS_API_ADDR",
                message: e.to_string(),
            })?;

        let poll_ms = match get("WORKER_POLL_INTERVAL_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: "WORKER_POLL_INTERVAL_MS",
                message: e.to_string(),
            })?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };
        if poll_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "WORKER_POLL_INTERVAL_MS",
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            redis_url: get("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            database_url: get("DATABASE_URL"),
            storage: StorageConfig {
                endpoint: get("S3_ENDPOINT"),
                bucket: get("S3_BUCKET"),
                region: get("S3_REGION"),
                access_key_id: get("S3_ACCESS_KEY_ID"),
                secret_access_key: get("S3_SECRET_ACCESS_KEY"),
                public_url: get("S3_PUBLIC_URL"),
                local_dir: get("STORAGE_DIR")
                    .unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string())
                    .into(),
            },
            api_token: get("JOBS_API_TOKEN"),
            api_addr,
            worker_poll_interval: Duration::from_millis(poll_ms),
        })
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    pub fn require_api_token(&self) -> Result<&str, ConfigError> {
        self.api_token
            .as_deref()
            .ok_or(ConfigError::Missing("JOBS_API_TOKEN"))
    }
}
