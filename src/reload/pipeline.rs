//! Reload stages
//!
//! `LocaleSet` -> `DirectoryMap` -> `LoadOutcome` -> `StagedReload`.
//! Each stage takes the previous stage's output by reference and can be run
//! and tested on its own. Nothing here touches the live caches.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::BulkLoader;
use crate::CacheSnapshot;
use crate::DirectoryMap;
use crate::LoadOutcome;
use crate::LocaleLoad;
use crate::LocaleRegistry;
use crate::LocaleSet;
use crate::MessageMap;
use crate::Result;

pub struct ReloadPipeline {
    registry: LocaleRegistry,
    loader: BulkLoader,
    base_dir: String,
}

/// Replacement data built entirely off to the side of the live cache
#[derive(Debug)]
pub struct StagedReload {
    pub snapshot: CacheSnapshot,
    /// Locales whose load failed and kept their previous data
    pub failed: Vec<String>,
}

impl StagedReload {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl ReloadPipeline {
    pub fn new(
        registry: LocaleRegistry,
        loader: BulkLoader,
        base_dir: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            loader,
            base_dir: base_dir.into(),
        }
    }

    pub async fn discover(&self) -> LocaleSet {
        self.registry.resolve().await
    }

    pub fn resolve_directories(
        &self,
        locales: &LocaleSet,
    ) -> Result<DirectoryMap> {
        DirectoryMap::resolve(locales, &self.base_dir)
    }

    pub async fn load(
        &self,
        directories: &DirectoryMap,
    ) -> LoadOutcome {
        self.loader.load_all(directories).await
    }

    /// Runs discovery, directory resolution, load and staging in order.
    pub async fn run(
        &self,
        previous: &CacheSnapshot,
        generation: u64,
    ) -> Result<StagedReload> {
        let locales = self.discover().await;
        let directories = self.resolve_directories(&locales)?;
        let outcome = self.load(&directories).await;
        Ok(stage(previous, &directories, outcome, generation))
    }
}

/// Builds the next snapshot from a load outcome.
///
/// A locale whose load failed keeps the map it had in `previous`, or gets an
/// empty map when it is new. Locales no longer in `directories` are dropped.
pub fn stage(
    previous: &CacheSnapshot,
    directories: &DirectoryMap,
    outcome: LoadOutcome,
    generation: u64,
) -> StagedReload {
    let mut messages: HashMap<_, Arc<MessageMap>> = HashMap::with_capacity(directories.len());
    let mut failed = Vec::new();

    for (locale, load) in outcome.results {
        let map = match load {
            LocaleLoad::Loaded(map) => Arc::new(map),
            LocaleLoad::Failed(_) => {
                failed.push(locale.to_string());
                match previous.messages_for(&locale) {
                    Some(map) => map.clone(),
                    None => {
                        warn!(%locale, "no previous data for failed locale, serving empty map");
                        Arc::new(MessageMap::new())
                    }
                }
            }
        };
        messages.insert(locale, map);
    }

    StagedReload {
        snapshot: CacheSnapshot::new(generation, directories.locales(), messages),
        failed,
    }
}
