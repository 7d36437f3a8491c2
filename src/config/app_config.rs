use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use super::{
    AlertConfig, BaseHttpClientConfig, ServerConfig, deserialize_duration_from_seconds,
};
use crate::models::notifier::{NotifierConfig, NotifierConfigError};

/// Provides the default value for database_url.
fn default_database_url() -> String {
    "sqlite://sentinel.db".to_string()
}

/// Provides the default value for shutdown_timeout.
fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Errors raised while loading or validating the application configuration.
#[derive(Debug, Error)]
pub enum AppConfigError {
    /// The configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    /// The environment label is missing.
    #[error("Configuration field `environment` is required.")]
    MissingEnvironment,

    /// The notifier section is invalid.
    #[error("Invalid notifier configuration: {0}")]
    Notifier(#[from] NotifierConfigError),
}

/// Application configuration for Sentinel.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Label identifying the deployment (e.g. "production"), shown in alerts.
    #[serde(default)]
    pub environment: String,

    /// Database URL for the SQLite database.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Cooldown and detail visibility for alerts.
    #[serde(default)]
    pub alert: AlertConfig,

    /// The notification backend alerts are sent through.
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Configuration for the base HTTP client.
    #[serde(default)]
    pub http_base_config: BaseHttpClientConfig,

    /// The maximum time in seconds to wait for in-flight alerts on shutdown.
    #[serde(
        rename = "shutdown_timeout_secs",
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_shutdown_timeout"
    )]
    pub shutdown_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: String::new(),
            database_url: default_database_url(),
            server: ServerConfig::default(),
            alert: AlertConfig::default(),
            notifier: NotifierConfig::default(),
            http_base_config: BaseHttpClientConfig::default(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl AppConfig {
    /// Creates a new `AppConfig` from `<config_dir>/app.yaml` (optional)
    /// overlaid with `SENTINEL__*` environment variables, then validates it.
    pub fn new(config_dir: Option<&str>) -> Result<Self, AppConfigError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/app.yaml", config_dir_str)).required(false))
            .add_source(Environment::with_prefix("SENTINEL").separator("__"))
            .build()?;
        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants deserialization cannot express.
    pub fn validate(&self) -> Result<(), AppConfigError> {
        if self.environment.trim().is_empty() {
            return Err(AppConfigError::MissingEnvironment);
        }
        self.notifier.validate()?;
        Ok(())
    }

    /// Creates a new `AppConfigBuilder` for testing purposes.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// A builder for creating `AppConfig` instances in tests.
#[derive(Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Sets the environment label.
    pub fn environment(mut self, environment: &str) -> Self {
        self.config.environment = environment.to_string();
        self
    }

    /// Sets the database URL.
    pub fn database_url(mut self, url: &str) -> Self {
        self.config.database_url = url.to_string();
        self
    }

    /// Sets the alert cooldown.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.alert.cooldown = cooldown;
        self
    }

    /// Sets the visible detail keys.
    pub fn visible_details(mut self, keys: &[&str]) -> Self {
        self.config.alert.visible_details = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Sets the notifier.
    pub fn notifier(mut self, notifier: NotifierConfig) -> Self {
        self.config.notifier = notifier;
        self
    }

    /// Sets the HTTP listen address.
    pub fn listen_address(mut self, address: &str) -> Self {
        self.config.server.listen_address = address.to_string();
        self
    }

    /// Sets the API key required by the intake endpoint.
    pub fn api_key(mut self, key: &str) -> Self {
        self.config.server.api_key = Some(key.to_string());
        self
    }

    /// Builds the `AppConfig`.
    pub fn build(self) -> AppConfig {
        self.config
    }
}
