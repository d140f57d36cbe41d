//! Locale discovery.
//!
//! The active locale set lives under a single store key as a comma-separated
//! list. An absent, blank or unreadable value falls back to the configured
//! default locales, so discovery never aborts a reload.

use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::utils::async_task::task_with_timeout_and_exponential_backoff;
use crate::BackoffPolicy;
use crate::KvStore;
use crate::Locale;
use crate::LocaleSet;
use crate::TranslationsConfig;

pub struct LocaleRegistry {
    store: Arc<dyn KvStore>,
    locales_key: String,
    defaults: LocaleSet,
    retry: BackoffPolicy,
}

impl LocaleRegistry {
    pub fn new(
        store: Arc<dyn KvStore>,
        config: &TranslationsConfig,
        retry: BackoffPolicy,
    ) -> Self {
        let defaults = Locale::parse_list(&config.default_locales.join(","));
        Self {
            store,
            locales_key: config.locales_key.clone(),
            defaults,
            retry,
        }
    }

    pub fn defaults(&self) -> &LocaleSet {
        &self.defaults
    }

    /// Reads the locales key and returns the active locale set.
    pub async fn resolve(&self) -> LocaleSet {
        let store = self.store.clone();
        let key = self.locales_key.clone();
        let read = task_with_timeout_and_exponential_backoff(
            || {
                let store = store.clone();
                let key = key.clone();
                async move { store.get(&key).await }
            },
            self.retry,
        )
        .await;

        let value = match read {
            Ok(Some(value)) if !value.trim().is_empty() => value,
            Ok(Some(_)) => {
                info!(key = %self.locales_key, "locales key is blank, using default locales");
                return self.defaults.clone();
            }
            Ok(None) => {
                info!(key = %self.locales_key, "locales key is absent, using default locales");
                return self.defaults.clone();
            }
            Err(e) => {
                warn!(key = %self.locales_key, "store unavailable while reading locales, using default locales: {}", e);
                return self.defaults.clone();
            }
        };

        let locales = Locale::parse_list(&value);
        if locales.is_empty() {
            warn!(key = %self.locales_key, value, "no valid locale in locales key, using default locales");
            return self.defaults.clone();
        }
        debug!(count = locales.len(), value, "resolved active locales");
        locales
    }
}
