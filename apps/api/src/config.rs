//! API configuration module.
//!
//! Layered with the `config` crate, later sources win:
//!
//! ```text
//! built-in defaults  →  shopfront.toml (optional)  →  SHOPFRONT_* env vars
//! ```
//!
//! e.g. `SHOPFRONT_HTTP_PORT=9000` overrides `http_port`.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use shopfront_db::{DbConfig, RetryPolicy};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Development-only signing secret. Startup warns when it is still in use.
pub const DEV_JWT_SECRET: &str = "shopfront-dev-secret-change-in-production";

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Primary database (URL or file path)
    pub database_url: String,

    /// Local database used when the primary stays unreachable
    pub fallback_database_url: Option<String>,

    /// Attempts against the primary before falling back
    pub connect_attempts: u32,

    /// Pause between primary attempts
    pub connect_retry_delay_ms: u64,

    /// Pool size
    pub max_connections: u32,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// HS256 signing secret
    pub jwt_secret: String,

    /// Bearer token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Session store file
    pub session_file: String,

    /// When set and no user exists, an `admin` user is created with it
    pub bootstrap_admin_password: Option<String>,
}

impl ApiConfig {
    /// Loads `shopfront.toml` (if present) and `SHOPFRONT_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(Some(Path::new("shopfront.toml")), Environment::with_prefix("SHOPFRONT"))
    }

    /// Loads from an explicit file and environment source.
    pub fn from_sources(file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("http_port", 8080)?
            .set_default("database_url", "shopfront.db")?
            .set_default("connect_attempts", 3)?
            .set_default("connect_retry_delay_ms", 2000)?
            .set_default("max_connections", 5)?
            .set_default("request_timeout_secs", 30)?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("jwt_lifetime_secs", 8 * 3600)?
            .set_default("session_file", "sessions.json")?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config: ApiConfig = builder
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue("jwt_secret".to_string()));
        }
        if self.connect_attempts == 0 {
            return Err(ConfigError::InvalidValue("connect_attempts".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("request_timeout_secs".to_string()));
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_url".to_string()));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.http_port))
    }

    pub fn primary_db(&self) -> DbConfig {
        DbConfig::from_url(&self.database_url).max_connections(self.max_connections)
    }

    pub fn fallback_db(&self) -> Option<DbConfig> {
        self.fallback_database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| DbConfig::from_url(url).max_connections(self.max_connections))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.connect_attempts,
            delay: Duration::from_millis(self.connect_retry_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
