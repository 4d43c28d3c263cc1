//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (FEDICACHE__*, override)

use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Remote service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// API base URL, including the version prefix
    /// (e.g. "https://mastodon.social/api/v1")
    pub base_url: Url,
}

/// Credential configuration
///
/// Credential acquisition and storage live outside this crate; the data
/// layer only needs the bearer token (if any) at request time.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    pub access_token: Option<String>,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Capacity of the committed-write notification channel. Watchers that
    /// fall further behind than this recompose from scratch.
    pub change_buffer: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (FEDICACHE__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("remote.base_url", "https://mastodon.social/api/v1")?
            .set_default("database.path", "fedicache.db")?
            .set_default("cache.change_buffer", 256)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (FEDICACHE__*)
            .add_source(
                Environment::with_prefix("FEDICACHE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        match self.remote.base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(crate::error::AppError::Config(format!(
                    "remote.base_url must be http or https, got {other}"
                )));
            }
        }

        if self.cache.change_buffer == 0 {
            return Err(crate::error::AppError::Config(
                "cache.change_buffer must be greater than 0".to_string(),
            ));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(crate::error::AppError::Config(
                "database.path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
