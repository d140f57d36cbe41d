use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::BackoffPolicy;
use crate::BulkLoader;
use crate::FormatCache;
use crate::KvStore;
use crate::LocaleRegistry;
use crate::MemoryStore;
use crate::ReloadCoordinator;
use crate::ReloadPipeline;
use crate::ReloadState;
use crate::ReloadStatus;
use crate::TaskPools;
use crate::TranslationCache;
use crate::TranslatorConfig;

pub(crate) fn fast_retry() -> BackoffPolicy {
    BackoffPolicy {
        max_retries: 2,
        timeout_ms: 2000,
        base_delay_ms: 1,
        max_delay_ms: 2,
    }
}

pub(crate) fn test_config() -> TranslatorConfig {
    let mut config = TranslatorConfig::default();
    config.store.retry = fast_retry();
    config
}

/// `bn` and `en` registered, one greeting each
pub(crate) fn seeded_store() -> MemoryStore {
    MemoryStore::with_entries([
        ("/locales", "bn,en"),
        ("/messages/en/greet.hello", "Hello {0}"),
        ("/messages/en/greet.bye", "Bye {0}"),
        ("/messages/bn/greet.hello", "Nomoskar {0}"),
    ])
}

pub(crate) struct CoordinatorFixture {
    pub coordinator: Arc<ReloadCoordinator>,
    pub cache: Arc<TranslationCache>,
    pub formats: Arc<FormatCache>,
}

pub(crate) fn coordinator_over(store: Arc<dyn KvStore>) -> CoordinatorFixture {
    let config = test_config();
    let pools = TaskPools::current();
    let registry = LocaleRegistry::new(store.clone(), &config.translations, config.store.retry);
    let loader = BulkLoader::new(store, config.store.retry, pools.clone());
    let pipeline = ReloadPipeline::new(registry, loader, config.translations.base_dir.clone());

    let cache = Arc::new(TranslationCache::new());
    let formats = Arc::new(FormatCache::new());
    let coordinator = Arc::new(ReloadCoordinator::new(pipeline, cache.clone(), formats.clone(), pools));
    CoordinatorFixture {
        coordinator,
        cache,
        formats,
    }
}

/// Waits until a reload with at least `generation` settled.
pub(crate) async fn wait_settled(
    rx: &mut watch::Receiver<ReloadStatus>,
    generation: u64,
) -> ReloadStatus {
    let status = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.generation >= generation && s.state != ReloadState::Loading),
    )
    .await
    .expect("reload did not settle in time")
    .expect("status channel closed");
    status.clone()
}

/// Polls `condition` every millisecond for up to five seconds.
pub(crate) async fn eventually<F>(condition: F)
where
    F: Fn() -> bool,
{
    for _ in 0..5000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not met in time");
}
