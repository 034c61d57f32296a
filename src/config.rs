use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

/// Linear backoff schedule: attempt `n` (1-based) waits `n * backoff_ms`
/// before the next try.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub rate_limit_backoff_ms: u64,
    pub network_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path)
    }
}

/// Secrets loaded exclusively from environment variables.
/// Not serializable, not stored in config files.
pub struct Secrets {
    pub api_key: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("SPORTRADAR_API_KEY").ok(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, overlaying environment
    /// variables for secrets.
    pub fn load(path: &Path) -> Result<(Self, Secrets)> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok((config, Secrets::from_env()))
    }

    /// Validate credentials once at startup, before any network or
    /// storage activity. Returns the API key on success.
    pub fn validate(&self, secrets: &Secrets) -> Result<String, ConfigError> {
        let api_key = match &secrets.api_key {
            Some(key) if !key.is_empty() && !key.starts_with("YOUR_") => key.clone(),
            _ => return Err(ConfigError::ApiKeyPlaceholder),
        };

        if self.database.path.is_empty() || self.database.path.contains("YOUR_") {
            return Err(ConfigError::DatabasePlaceholder);
        }

        Ok(api_key)
    }
}
