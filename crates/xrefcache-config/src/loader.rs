//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.xrefcache/config.toml`
//! 2. Local config: `.xrefcache/config.toml` (in the working directory)
//! 3. An explicit file passed with `--config`
//! 4. CLI overrides
//!
//! Later sources override earlier ones.

use crate::error::ConfigError;
use crate::{ApiConfig, CacheConfig, ConfigOverrides, LogFormat, LoggingConfig, XrefConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".xrefcache";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".xrefcache";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.xrefcache`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<XrefConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.xrefcache`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    ///
    /// Useful for testing.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path below `root`.
    pub fn local_config_path(&self, root: &Path) -> PathBuf {
        root.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides.
    pub fn load(
        &mut self,
        root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<XrefConfig, ConfigError> {
        self.load_with_file(root, None, overrides)
    }

    /// Like [`load`](Self::load), with an explicit file merged after the
    /// local config. A missing explicit file is an error.
    pub fn load_with_file(
        &mut self,
        root: &Path,
        explicit: Option<&Path>,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<XrefConfig, ConfigError> {
        let mut config = XrefConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = self.load_local(root)? {
            config = merge_configs(config, local_config);
        }

        if let Some(path) = explicit {
            debug!("Loading config from {:?}", path);
            config = merge_configs(config, load_config_file(path)?);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<XrefConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;

        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration below `root`.
    pub fn load_local(&self, root: &Path) -> Result<Option<XrefConfig>, ConfigError> {
        let local_path = self.local_config_path(root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Save configuration to the global config file.
    pub fn save_global(&self, config: &XrefConfig) -> Result<(), ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };

        save_config_file(&global_dir.join(CONFIG_FILE_NAME), config)
    }

    /// Save configuration to the local config file below `root`.
    pub fn save_local(&self, root: &Path, config: &XrefConfig) -> Result<(), ConfigError> {
        save_config_file(&self.local_config_path(root), config)
    }

    /// Initialize the global configuration directory.
    ///
    /// Creates `~/.xrefcache/config.toml` with default configuration unless
    /// it already exists.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };
        init_dir(global_dir)
    }

    /// Initialize local configuration below `root`.
    pub fn init_local(&self, root: &Path) -> Result<PathBuf, ConfigError> {
        init_dir(&root.join(LOCAL_CONFIG_DIR))
    }

    /// Clear cached global configuration.
    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

fn init_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        save_config_file(&config_path, &XrefConfig::default())?;
    }

    Ok(config_path)
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<XrefConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &XrefConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Merge two configurations, with `overlay` taking precedence.
///
/// Overlay values equal to the default keep the base value, so partial
/// files only override what they set.
fn merge_configs(base: XrefConfig, overlay: XrefConfig) -> XrefConfig {
    XrefConfig {
        api: merge_api(base.api, overlay.api),
        cache: merge_cache(base.cache, overlay.cache),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

fn merge_api(base: ApiConfig, overlay: ApiConfig) -> ApiConfig {
    let defaults = ApiConfig::default();
    ApiConfig {
        url: if overlay.url != defaults.url {
            overlay.url
        } else {
            base.url
        },
        api_key: overlay.api_key.or(base.api_key),
        api_key_env: if overlay.api_key_env != defaults.api_key_env {
            overlay.api_key_env
        } else {
            base.api_key_env
        },
        timeout_secs: if overlay.timeout_secs != defaults.timeout_secs {
            overlay.timeout_secs
        } else {
            base.timeout_secs
        },
        page_limit: if overlay.page_limit != defaults.page_limit {
            overlay.page_limit
        } else {
            base.page_limit
        },
    }
}

fn merge_cache(base: CacheConfig, overlay: CacheConfig) -> CacheConfig {
    CacheConfig {
        event_capacity: if overlay.event_capacity != CacheConfig::default().event_capacity {
            overlay.event_capacity
        } else {
            base.event_capacity
        },
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    LoggingConfig {
        level: if overlay.level != "info" {
            overlay.level
        } else {
            base.level
        },
        format: if overlay.format != LogFormat::Text {
            overlay.format
        } else {
            base.format
        },
    }
}
