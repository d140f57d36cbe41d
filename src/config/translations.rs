use serde::Deserialize;
use serde::Serialize;

use super::invalid;
use crate::DirectoryMap;
use crate::Locale;
use crate::Result;

/// Store-side layout of the translation data
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationsConfig {
    /// Root directory holding one sub-directory per locale
    ///
    /// Default: `/messages`
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Key whose value is the comma-separated list of active locales
    ///
    /// Default: `/locales`
    #[serde(default = "default_locales_key")]
    pub locales_key: String,

    /// Prefix watched for changes that trigger a reload
    ///
    /// Default: `/messages`
    #[serde(default = "default_watch_prefix")]
    pub watch_prefix: String,

    /// Locales used when the locales key is absent, blank or unreadable
    ///
    /// Default: `["bn", "en"]`
    #[serde(default = "default_locales")]
    pub default_locales: Vec<String>,
}

impl Default for TranslationsConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            locales_key: default_locales_key(),
            watch_prefix: default_watch_prefix(),
            default_locales: default_locales(),
        }
    }
}

impl TranslationsConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.base_dir.starts_with('/') {
            return Err(invalid(format!(
                "translations.base_dir {:?} must be an absolute key path",
                self.base_dir
            )));
        }
        if self.locales_key.trim().is_empty() {
            return Err(invalid("translations.locales_key cannot be empty"));
        }
        if self.watch_prefix.trim().is_empty() {
            return Err(invalid("translations.watch_prefix cannot be empty"));
        }
        if self.default_locales.is_empty() {
            return Err(invalid("translations.default_locales cannot be empty"));
        }
        for tag in &self.default_locales {
            Locale::parse(tag).map_err(|_| {
                invalid(format!("translations.default_locales contains invalid tag {tag:?}"))
            })?;
        }
        let defaults = Locale::parse_list(&self.default_locales.join(","));
        DirectoryMap::resolve(&defaults, &self.base_dir).map_err(|e| {
            invalid(format!("translations.default_locales cannot be loaded: {e}"))
        })?;
        Ok(())
    }
}

fn default_base_dir() -> String {
    "/messages".to_string()
}
fn default_locales_key() -> String {
    "/locales".to_string()
}
fn default_watch_prefix() -> String {
    "/messages".to_string()
}
fn default_locales() -> Vec<String> {
    vec!["bn".to_string(), "en".to_string()]
}
