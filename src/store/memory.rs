use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::KvStore;
use super::StoreResult;
use super::WatchBatch;
use super::WatchEvent;
use super::WatchEventType;
use super::WatchSink;
use crate::Error;
use crate::Result;

/// A single write applied through [`MemoryStore::apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Put { key: String, value: String },
    Delete { key: String },
}

impl Mutation {
    pub fn put(
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Mutation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Mutation::Delete { key: key.into() }
    }
}

struct PrefixWatcher {
    prefix: String,
    sink: WatchSink,
}

struct MemoryStoreInner {
    data: RwLock<BTreeMap<String, String>>,
    watchers: Mutex<Vec<PrefixWatcher>>,
}

/// Ordered in-process key-value store with prefix watches
///
/// Every write is delivered to each watcher whose prefix matches as one
/// batch, in write order. Cloning shares the underlying data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys", &self.inner.data.read().len())
            .field("watchers", &self.inner.watchers.lock().len())
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStoreInner {
                data: RwLock::new(BTreeMap::new()),
                watchers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Creates a store pre-populated with `entries` without notifying anyone.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        {
            let mut data = store.inner.data.write();
            for (k, v) in entries {
                data.insert(k.into(), v.into());
            }
        }
        store
    }

    /// Loads a TOML file of `"key" = "value"` pairs.
    ///
    /// Non-string values are skipped with a warning.
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| {
            Error::Fatal(format!("seed file {} is not valid TOML: {}", path.display(), e))
        })?;

        let mut entries = Vec::with_capacity(table.len());
        for (key, value) in table {
            match value {
                toml::Value::String(s) => entries.push((key, s)),
                other => warn!(%key, kind = other.type_str(), "skipping non-string seed value"),
            }
        }
        debug!(path = %path.display(), keys = entries.len(), "seeded memory store");
        Ok(Self::with_entries(entries))
    }

    pub fn put(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.apply(vec![Mutation::put(key, value)]);
    }

    pub fn delete(
        &self,
        key: impl Into<String>,
    ) {
        self.apply(vec![Mutation::delete(key)]);
    }

    /// Applies all mutations atomically and notifies watchers with one batch.
    pub fn apply(
        &self,
        mutations: Vec<Mutation>,
    ) {
        let mut batch = Vec::with_capacity(mutations.len());
        {
            let mut data = self.inner.data.write();
            for mutation in mutations {
                match mutation {
                    Mutation::Put { key, value } => {
                        data.insert(key.clone(), value);
                        batch.push(WatchEvent::new(key, WatchEventType::Put));
                    }
                    Mutation::Delete { key } => {
                        if data.remove(&key).is_some() {
                            batch.push(WatchEvent::new(key, WatchEventType::Delete));
                        }
                    }
                }
            }
        }
        self.emit(batch);
    }

    /// Delivers a raw batch to matching watchers without touching data.
    pub fn emit(
        &self,
        batch: WatchBatch,
    ) {
        if batch.is_empty() {
            return;
        }
        let mut watchers = self.inner.watchers.lock();
        watchers.retain(|w| {
            let matching: WatchBatch = batch
                .iter()
                .filter(|e| e.key.starts_with(&w.prefix))
                .cloned()
                .collect();
            if matching.is_empty() {
                return true;
            }
            trace!(prefix = %w.prefix, events = matching.len(), "delivering watch batch");
            w.sink.send(matching).is_ok()
        });
    }

    pub fn len(&self) -> usize {
        self.inner.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.lock().len()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(
        &self,
        key: &str,
    ) -> StoreResult<Option<String>> {
        Ok(self.inner.data.read().get(key).cloned())
    }

    async fn get_range(
        &self,
        key: &str,
        is_prefix: bool,
    ) -> StoreResult<BTreeMap<String, String>> {
        let data = self.inner.data.read();
        if !is_prefix {
            return Ok(data
                .get_key_value(key)
                .map(|(k, v)| (k.clone(), v.clone()))
                .into_iter()
                .collect());
        }
        Ok(data
            .range(key.to_string()..)
            .take_while(|(k, _)| k.starts_with(key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn watch_prefix(
        &self,
        prefix: &str,
        sink: WatchSink,
    ) -> StoreResult<()> {
        debug!(prefix, "registering prefix watch");
        self.inner.watchers.lock().push(PrefixWatcher {
            prefix: prefix.to_string(),
            sink,
        });
        Ok(())
    }

    fn stop_watcher(&self) {
        let mut watchers = self.inner.watchers.lock();
        if !watchers.is_empty() {
            debug!(count = watchers.len(), "stopping prefix watches");
        }
        watchers.clear();
    }
}
