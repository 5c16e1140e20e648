//! Configuration management for the delivery tracker
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with DT__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::store::{FileMedium, StorageOptions};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub storage: StorageConfig,

    pub webhook: WebhookConfig,

    pub receipts: ReceiptsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// SQLite URL of the primary medium
    pub database_url: String,

    /// Set to false to force the fallback medium
    pub primary_enabled: bool,

    /// Directory holding the fallback blobs
    pub fallback_dir: String,

    pub max_connections: u32,
}

/// Which workflow webhook receives submissions
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WebhookMode {
    Test,
    Production,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    pub mode: WebhookMode,
    pub test_url: String,
    pub production_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReceiptsConfig {
    /// Recognition proxy endpoint
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Location receipt-scanned purchases are filed under
    pub default_location: String,
}

impl WebhookConfig {
    /// URL for the configured mode
    pub fn url(&self) -> &str {
        match self.mode {
            WebhookMode::Test => &self.test_url,
            WebhookMode::Production => &self.production_url,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl StorageConfig {
    /// Probe inputs for the document store
    pub fn options(&self) -> StorageOptions {
        StorageOptions {
            database_url: self.primary_enabled.then(|| self.database_url.clone()),
            max_connections: self.max_connections,
            medium: Arc::new(FileMedium::new(&self.fallback_dir)),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("DT_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("storage.database_url", "sqlite://data/delivery-tracker.db")?
            .set_default("storage.primary_enabled", true)?
            .set_default("storage.fallback_dir", "data/fallback")?
            .set_default("storage.max_connections", 5)?
            .set_default("webhook.mode", "test")?
            .set_default(
                "webhook.test_url",
                "https://n8n.dmytrotovstytskyi.online/webhook-test/deliverygb",
            )?
            .set_default(
                "webhook.production_url",
                "https://n8n.dmytrotovstytskyi.online/webhook/deliverygb",
            )?
            .set_default("webhook.timeout_secs", 30)?
            .set_default("receipts.endpoint", "http://localhost:3001/api/gemini")?
            .set_default("receipts.timeout_secs", 60)?
            .set_default("receipts.default_location", shared::RECEIPT_LOCATION)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (DT__ prefix)
            .add_source(
                Environment::with_prefix("DT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_url_follows_mode() {
        let mut webhook = WebhookConfig {
            mode: WebhookMode::Test,
            test_url: "http://test".to_string(),
            production_url: "http://prod".to_string(),
            timeout_secs: 30,
        };
        assert_eq!(webhook.url(), "http://test");
        webhook.mode = WebhookMode::Production;
        assert_eq!(webhook.url(), "http://prod");
        assert_eq!(webhook.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_disabled_primary_is_skipped() {
        let storage = StorageConfig {
            database_url: "sqlite::memory:".to_string(),
            primary_enabled: false,
            fallback_dir: "unused".to_string(),
            max_connections: 1,
        };
        assert!(storage.options().database_url.is_none());
    }
}
