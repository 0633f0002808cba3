//! xrefcache Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.xrefcache/config.toml`
//! - Local config: `.xrefcache/config.toml` (in the working directory)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};

/// Default API server URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default environment variable holding the API key.
pub const DEFAULT_API_KEY_ENV: &str = "XREFCACHE_API_KEY";

/// Root configuration for xrefcache.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct XrefConfig {
    /// API server configuration
    pub api: ApiConfig,

    /// In-memory store configuration
    pub cache: CacheConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// API server configuration.
///
/// # Example TOML
///
/// ```toml
/// [api]
/// url = "https://aleph.example.org"
/// api_key_env = "XREFCACHE_API_KEY"
/// timeout_secs = 30
/// page_limit = 50
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the server; API paths are resolved below `/api/1/`
    pub url: String,

    /// API key given inline (prefer `api_key_env`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name containing the API key
    pub api_key_env: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Items requested per match page
    pub page_limit: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            api_key: None,
            api_key_env: Some(DEFAULT_API_KEY_ENV.to_string()),
            timeout_secs: 30,
            page_limit: 50,
        }
    }
}

impl ApiConfig {
    /// Resolve the API key: the inline value first, then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.is_empty())
    }

    /// Validate the API settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ConfigError::invalid_value("api.url", "must not be empty"));
        }
        let Some(rest) = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
        else {
            return Err(ConfigError::invalid_value(
                "api.url",
                format!("'{}' must start with http:// or https://", url),
            ));
        };
        if rest.is_empty() || rest.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "api.url",
                format!("'{}' has no host", url),
            ));
        }
        if self.page_limit == 0 {
            return Err(ConfigError::invalid_value(
                "api.page_limit",
                "must be greater than zero",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "api.timeout_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// In-memory store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Events buffered per subscriber before it must resynchronise
    pub event_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::invalid_value(
                "logging.format",
                format!("unknown format '{}'. Valid values: text, json", s),
            )),
        }
    }
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override API server URL
    pub api_url: Option<String>,

    /// Override API key
    pub api_key: Option<String>,

    /// Override page size
    pub page_limit: Option<u32>,

    /// Override log level
    pub log_level: Option<String>,

    /// Override log format
    pub log_format: Option<LogFormat>,
}

impl XrefConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref url) = overrides.api_url {
            self.api.url = url.clone();
        }

        if let Some(ref key) = overrides.api_key {
            self.api.api_key = Some(key.clone());
        }

        if let Some(limit) = overrides.page_limit {
            self.api.page_limit = limit;
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }

        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        if self.cache.event_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "cache.event_capacity",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = XrefConfig::default();
        assert_eq!(config.api.url, "http://localhost:8080");
        assert_eq!(config.api.api_key_env.as_deref(), Some("XREFCACHE_API_KEY"));
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.api.page_limit, 50);
        assert_eq!(config.cache.event_capacity, 256);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = XrefConfig::default();
        let overrides = ConfigOverrides {
            api_url: Some("https://aleph.example.org".to_string()),
            page_limit: Some(10),
            log_level: Some("debug".to_string()),
            log_format: Some(LogFormat::Json),
            ..Default::default()
        };

        config.apply_overrides(&overrides);

        assert_eq!(config.api.url, "https://aleph.example.org");
        assert_eq!(config.api.page_limit, 10);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        for url in ["", "   ", "localhost:8080", "ftp://host", "http://", "https:///path"] {
            let mut config = XrefConfig::default();
            config.api.url = url.to_string();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("api.url"), "{url}: {err}");
        }
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = XrefConfig::default();
        config.api.page_limit = 0;
        assert!(config.validate().unwrap_err().to_string().contains("page_limit"));

        let mut config = XrefConfig::default();
        config.cache.event_capacity = 0;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("event_capacity"));

        let mut config = XrefConfig::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inline_api_key_wins() {
        let api = ApiConfig {
            api_key: Some("inline".to_string()),
            api_key_env: Some("XREFCACHE_TEST_KEY_UNSET_VARIABLE".to_string()),
            ..Default::default()
        };
        assert_eq!(api.resolve_api_key().as_deref(), Some("inline"));

        let api = ApiConfig {
            api_key: None,
            api_key_env: Some("XREFCACHE_TEST_KEY_UNSET_VARIABLE".to_string()),
            ..Default::default()
        };
        assert_eq!(api.resolve_api_key(), None);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = XrefConfig::default();
        config.api.url = "https://aleph.example.org".to_string();
        config.logging.format = LogFormat::Json;

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: XrefConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: XrefConfig = toml::from_str(
            r#"
            [api]
            page_limit = 20
            "#,
        )
        .unwrap();
        assert_eq!(parsed.api.page_limit, 20);
        assert_eq!(parsed.api.url, DEFAULT_API_URL);
        assert_eq!(parsed.cache, CacheConfig::default());
    }
}
