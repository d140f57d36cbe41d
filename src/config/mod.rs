//! Configuration management module for the translation cache.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`I18N__` prefix)
//! - Component-wise validation
mod monitoring;
mod pools;
mod reload;
mod retry;
mod server;
mod store;
mod translations;
pub use monitoring::*;
pub use pools::*;
pub use reload::*;
pub use retry::*;
pub use server::*;
pub use store::*;
pub use translations::*;
use std::env;
use std::fmt::Debug;
use std::path::PathBuf;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Main configuration container for the translator components
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone)]
pub struct TranslatorConfig {
    /// Backing key-value store connection parameters
    #[serde(default)]
    pub store: StoreConfig,
    /// Store layout of locales and translation directories
    #[serde(default)]
    pub translations: TranslationsConfig,
    /// Reload execution mode
    #[serde(default)]
    pub reload: ReloadConfig,
    /// Execution pool sizing
    #[serde(default)]
    pub pools: PoolConfig,
    /// HTTP lookup endpoint
    #[serde(default)]
    pub server: ServerConfig,
    /// Metrics and monitoring settings
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Log files output directory
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            translations: TranslationsConfig::default(),
            reload: ReloadConfig::default(),
            pools: PoolConfig::default(),
            server: ServerConfig::default(),
            monitoring: MonitoringConfig::default(),
            log_dir: default_log_dir(),
        }
    }
}

impl Debug for TranslatorConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TranslatorConfig")
            .field("translations", &self.translations)
            .field("reload", &self.reload)
            .finish_non_exhaustive()
    }
}

impl TranslatorConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `I18N__` prefix (highest priority)
    ///
    /// # Note
    /// This method does NOT validate the configuration. Callers MUST call `validate()`
    /// before using the configuration.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/translator.toml");
    /// std::env::set_var("I18N__TRANSLATIONS__BASE_DIR", "/messages");
    /// let cfg = TranslatorConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    ///
    /// Must be called after all configuration overrides are applied.
    pub fn validate(self) -> Result<Self> {
        self.store.validate()?;
        self.translations.validate()?;
        self.pools.validate()?;
        self.server.validate()?;
        self.monitoring.validate()?;

        if self.server.enabled
            && self.monitoring.prometheus_enabled
            && self.server.listen_port == self.monitoring.prometheus_port
        {
            return Err(invalid(format!(
                "server.listen_port and monitoring.prometheus_port both use {}",
                self.server.listen_port
            )));
        }
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("I18N")
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("store.endpoints")
        .with_list_parse_key("translations.default_locales")
}

pub(super) fn invalid(msg: impl Into<String>) -> Error {
    Error::Config(ConfigError::Message(msg.into()))
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}
