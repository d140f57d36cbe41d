//! Bulk loading of per-locale translations.
//!
//! One prefix range read per locale directory. Loads for different locales
//! run concurrently on the store pool and fail independently.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::utils::async_task::task_with_timeout_and_exponential_backoff;
use crate::BackoffPolicy;
use crate::DirectoryMap;
use crate::KvStore;
use crate::Locale;
use crate::StoreError;
use crate::TaskPools;
use crate::LOCALE_LOAD_FAILURES;

/// Message code to raw template
pub type MessageMap = HashMap<String, Arc<str>>;

/// Result of loading a single locale directory
#[derive(Debug, Clone)]
pub enum LocaleLoad {
    Loaded(MessageMap),
    Failed(StoreError),
}

impl LocaleLoad {
    pub fn is_failed(&self) -> bool {
        matches!(self, LocaleLoad::Failed(_))
    }
}

/// Per-locale load results, in directory order
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub results: Vec<(Locale, LocaleLoad)>,
}

impl LoadOutcome {
    pub fn failed_locales(&self) -> Vec<Locale> {
        self.results
            .iter()
            .filter(|(_, load)| load.is_failed())
            .map(|(l, _)| l.clone())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.results.iter().all(|(_, load)| !load.is_failed())
    }
}

pub struct BulkLoader {
    store: Arc<dyn KvStore>,
    retry: BackoffPolicy,
    pools: TaskPools,
}

impl BulkLoader {
    pub fn new(
        store: Arc<dyn KvStore>,
        retry: BackoffPolicy,
        pools: TaskPools,
    ) -> Self {
        Self { store, retry, pools }
    }

    /// Loads every directory of `directories` concurrently.
    pub async fn load_all(
        &self,
        directories: &DirectoryMap,
    ) -> LoadOutcome {
        let mut locales = Vec::with_capacity(directories.len());
        let mut handles = Vec::with_capacity(directories.len());
        for (locale, directory) in directories.iter() {
            let store = self.store.clone();
            let retry = self.retry;
            let directory = directory.to_string();
            locales.push(locale.clone());
            handles.push(
                self.pools
                    .store()
                    .spawn(async move { load_directory(store, &directory, retry).await }),
            );
        }

        let mut results = Vec::with_capacity(locales.len());
        for (locale, joined) in locales.into_iter().zip(join_all(handles).await) {
            let load = match joined {
                Ok(Ok(map)) => {
                    debug!(%locale, entries = map.len(), "locale loaded");
                    LocaleLoad::Loaded(map)
                }
                Ok(Err(e)) => {
                    warn!(%locale, "locale load failed: {}", e);
                    LOCALE_LOAD_FAILURES.with_label_values(&[&locale.to_string()]).inc();
                    LocaleLoad::Failed(e)
                }
                Err(e) => {
                    error!(%locale, "locale load task aborted: {:?}", e);
                    LOCALE_LOAD_FAILURES.with_label_values(&[&locale.to_string()]).inc();
                    LocaleLoad::Failed(StoreError::Unavailable(format!("load task aborted: {e}")))
                }
            };
            results.push((locale, load));
        }
        LoadOutcome { results }
    }
}

async fn load_directory(
    store: Arc<dyn KvStore>,
    directory: &str,
    retry: BackoffPolicy,
) -> std::result::Result<MessageMap, StoreError> {
    let raw = task_with_timeout_and_exponential_backoff(
        || {
            let store = store.clone();
            async move { store.get_range(directory, true).await }
        },
        retry,
    )
    .await?;
    Ok(process_entries(raw, directory))
}

/// Strips `directory` from every key and drops deleted entries.
///
/// A value that is blank or exactly `''` marks a deleted translation.
pub fn process_entries(
    raw: BTreeMap<String, String>,
    directory: &str,
) -> MessageMap {
    raw.into_iter()
        .filter_map(|(key, value)| {
            let code = key.strip_prefix(directory)?;
            if code.is_empty() || is_deleted(&value) {
                return None;
            }
            Some((code.to_string(), Arc::from(value)))
        })
        .collect()
}

fn is_deleted(value: &str) -> bool {
    value.trim().is_empty() || value == "''"
}
