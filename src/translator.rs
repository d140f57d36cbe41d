//! Host-facing translation API.
//!
//! [`Translator`] owns the caches, the reload coordinator and the watch.
//! Lookups only read the current cache snapshot, so they never block on the
//! store or on a running reload.

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::format_message;
use crate::BulkLoader;
use crate::ChangeWatcher;
use crate::CompiledFormat;
use crate::Error;
use crate::FormatCache;
use crate::KvStore;
use crate::Locale;
use crate::LocaleRegistry;
use crate::LocaleSet;
use crate::ReloadCoordinator;
use crate::ReloadMode;
use crate::ReloadPipeline;
use crate::ReloadStatus;
use crate::Result;
use crate::TaskPools;
use crate::TranslationCache;
use crate::TranslatorConfig;

pub struct Translator {
    store: Arc<dyn KvStore>,
    cache: Arc<TranslationCache>,
    formats: Arc<FormatCache>,
    coordinator: Arc<ReloadCoordinator>,
    pools: TaskPools,
    mode: ReloadMode,
    watch_prefix: String,
    started: AtomicBool,
    watcher: Mutex<Option<ChangeWatcher>>,
}

impl Translator {
    pub fn new(
        store: Arc<dyn KvStore>,
        config: &TranslatorConfig,
        pools: TaskPools,
    ) -> Self {
        let retry = config.store.retry;
        let registry = LocaleRegistry::new(store.clone(), &config.translations, retry);
        let loader = BulkLoader::new(store.clone(), retry, pools.clone());
        let pipeline = ReloadPipeline::new(registry, loader, config.translations.base_dir.clone());

        let cache = Arc::new(TranslationCache::new());
        let formats = Arc::new(FormatCache::new());
        let coordinator = Arc::new(ReloadCoordinator::new(
            pipeline,
            cache.clone(),
            formats.clone(),
            pools.clone(),
        ));

        Self {
            store,
            cache,
            formats,
            coordinator,
            pools,
            mode: config.reload.mode,
            watch_prefix: config.translations.watch_prefix.clone(),
            started: AtomicBool::new(false),
            watcher: Mutex::new(None),
        }
    }

    /// Subscribes to the watched prefix and runs the boot load.
    ///
    /// In sync mode this returns after the boot load settled. Only the first
    /// call starts anything; later or overlapping calls return `Ok` at once.
    pub async fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::AcqRel) {
            warn!("translator already started");
            return Ok(());
        }
        info!(mode = self.mode.as_str(), prefix = %self.watch_prefix, "starting translator");

        // Subscribed before the boot read: writes landing during it stay queued.
        let pending = match ChangeWatcher::subscribe(self.store.clone(), &self.watch_prefix) {
            Ok(pending) => pending,
            Err(e) => {
                self.started.store(false, Ordering::Release);
                return Err(e);
            }
        };
        self.coordinator.trigger(self.mode).await;

        let watcher = pending.spawn(self.coordinator.clone(), self.mode, &self.pools);
        let mut slot = self.watcher.lock();
        if self.coordinator.is_stopped() {
            debug!("translator stopped during boot, dropping watch");
            watcher.stop();
        } else {
            *slot = Some(watcher);
        }
        Ok(())
    }

    /// Stops the watch and any follow-up reload. Safe to call repeatedly.
    pub fn stop(&self) {
        self.coordinator.stop();
        if let Some(watcher) = self.watcher.lock().take() {
            watcher.stop();
        }
    }

    /// Compiled format for `code` in the registered locale matching `locale`.
    ///
    /// # Errors
    /// [`Error::LocaleNotSupported`] when no registered locale shares the
    /// base language of `locale`. An unknown code is `Ok(None)`.
    pub fn resolve(
        &self,
        code: &str,
        locale: &Locale,
    ) -> Result<Option<Arc<CompiledFormat>>> {
        let registered = self
            .cache
            .match_locale(locale)
            .ok_or_else(|| Error::LocaleNotSupported(locale.to_string()))?;

        // Supplier reads the live cache, never an earlier snapshot.
        Ok(self
            .formats
            .get_or_create(code, &registered, || self.cache.lookup(code, &registered)))
    }

    /// Renders `code` with `args`, or `None` when the code is unknown.
    pub fn message<A: fmt::Display>(
        &self,
        code: &str,
        args: &[A],
        locale: &Locale,
    ) -> Result<Option<String>> {
        Ok(self.resolve(code, locale)?.map(|format| format.render(args)))
    }

    /// Renders `code`, falling back to rendering `default` with the same
    /// arguments when the code is unknown.
    pub fn message_or_default<A: fmt::Display>(
        &self,
        code: &str,
        args: &[A],
        default: &str,
        locale: &Locale,
    ) -> Result<String> {
        if let Some(rendered) = self.message(code, args, locale)? {
            return Ok(rendered);
        }
        match format_message(default, locale, args) {
            Ok(rendered) => Ok(rendered),
            Err(e) => {
                warn!(code, "default message does not compile, returning it verbatim: {}", e);
                Ok(default.to_string())
            }
        }
    }

    /// Registered locales of the live snapshot
    pub fn locales(&self) -> LocaleSet {
        self.cache.locales()
    }

    pub fn state(&self) -> ReloadStatus {
        self.coordinator.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReloadStatus> {
        self.coordinator.subscribe()
    }

    /// Requests a reload outside of the watch, in the configured mode.
    pub async fn reload(&self) {
        self.coordinator.trigger(self.mode).await;
    }
}

impl Drop for Translator {
    fn drop(&mut self) {
        self.stop();
    }
}
