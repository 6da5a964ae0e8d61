/// Configuration loading and management for the application.
///
/// This module handles loading, parsing, and validating configuration
/// settings from a YAML configuration file or environment variables. It
/// provides strongly typed access to the console settings and the
/// protection API connection parameters.
///
/// # Configuration Flow
///
/// 1. Load configuration from YAML file or environment variables
/// 2. Parse into structured types
/// 3. Validate all required settings
/// 4. Make configuration available to application components
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Default base path of the protection API.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Default request timeout applied to every API call, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    /// File I/O errors when reading the configuration file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing errors in the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yml::Error),

    /// Configuration validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Console behavior settings
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Protection API connection settings
    pub api: ApiConfig,
}

/// Console behavior settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Logging level (e.g., "INFO", "DEBUG", "ERROR")
    pub debug_level: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            debug_level: "INFO".to_string(),
        }
    }
}

/// Protection API connection settings.
///
/// Controls where requests are sent, how long they may run, and which
/// credential accompanies them.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the protection API, including the versioned path
    pub base_url: String,

    /// Request timeout in seconds, applied to every call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional API key sent as the `X-API-Key` header on every request
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Loads configuration from environment variables.
///
/// Reads configuration values from environment variables, falling back to
/// default values where appropriate. An empty `PROMPTGUARD_API_KEY` is
/// treated the same as an absent one.
fn load_from_env() -> Config {
    info!("Loading configuration from environment variables");

    let console = ConsoleConfig {
        debug_level: env::var("PROMPTGUARD_DEBUG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
    };

    let api = ApiConfig {
        base_url: env::var("PROMPTGUARD_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
        timeout_secs: env::var("PROMPTGUARD_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
        api_key: env::var("PROMPTGUARD_API_KEY")
            .ok()
            .filter(|k| !k.is_empty()),
    };

    Config { console, api }
}

/// Loads configuration from a YAML file or environment variables.
///
/// First attempts to load configuration from the specified file path. If
/// the file doesn't exist, falls back to environment variables. In either
/// case environment variables override file values and the resulting
/// configuration is validated before being returned.
///
/// # Arguments
///
/// * `path` - Path to the YAML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Validated configuration object
/// * `Err(ConfigError)` - If loading or validation fails
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    if Path::new(path).exists() {
        info!("Loading configuration from file: {}", path);

        let content = fs::read_to_string(path)?;
        debug!("Successfully read configuration file");

        let mut config: Config = serde_yml::from_str(&content)?;
        debug!("Successfully parsed YAML configuration");

        override_with_env(&mut config);

        config.validate()?;
        info!("Configuration validated successfully");

        Ok(config)
    } else {
        info!(
            "Configuration file not found: {}. Using environment variables.",
            path
        );
        let config = load_from_env();
        config.validate()?;
        info!("Configuration from environment variables validated successfully");
        Ok(config)
    }
}

/// Override configuration values with environment variables if present
fn override_with_env(config: &mut Config) {
    if let Ok(debug_level) = env::var("PROMPTGUARD_DEBUG_LEVEL") {
        config.console.debug_level = debug_level;
    }

    if let Ok(base_url) = env::var("PROMPTGUARD_API_URL") {
        config.api.base_url = base_url;
    }

    if let Ok(timeout) = env::var("PROMPTGUARD_TIMEOUT_SECS") {
        if let Ok(timeout) = timeout.parse() {
            config.api.timeout_secs = timeout;
        }
    }

    if let Ok(api_key) = env::var("PROMPTGUARD_API_KEY") {
        if !api_key.is_empty() {
            config.api.api_key = Some(api_key);
        }
    }
}

impl Config {
    /// Validates all configuration settings.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If all validation checks pass
    /// * `Err(ConfigError)` - If any validation check fails
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "API base URL cannot be empty".into(),
            ));
        }

        if !self.api.base_url.starts_with("http") {
            return Err(ConfigError::ValidationError(
                "API base URL must start with http:// or https://".into(),
            ));
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Request timeout must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            console: ConsoleConfig::default(),
            api: ApiConfig {
                base_url: DEFAULT_API_BASE_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                api_key: None,
            },
        }
    }

    #[test]
    fn default_config_validates() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut config = base_config();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut config = base_config();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_without_optional_sections_parses() {
        let yaml = "api:\n  base_url: http://localhost:8000/api/v1\n";
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.api.api_key.is_none());
        assert_eq!(config.console.debug_level, "INFO");
    }
}
