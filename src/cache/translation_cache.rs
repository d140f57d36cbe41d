use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use crate::Locale;
use crate::LocaleSet;
use crate::MessageMap;
use crate::TRANSLATIONS_LOADED;

/// One immutable generation of translation data.
///
/// The locale set and the per-locale maps travel together, so a reader never
/// sees a locale without its map or a map for a locale that was removed.
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    pub generation: u64,
    pub locales: LocaleSet,
    pub messages: HashMap<Locale, Arc<MessageMap>>,
}

impl CacheSnapshot {
    pub fn new(
        generation: u64,
        locales: LocaleSet,
        messages: HashMap<Locale, Arc<MessageMap>>,
    ) -> Self {
        Self {
            generation,
            locales,
            messages,
        }
    }

    pub fn messages_for(
        &self,
        locale: &Locale,
    ) -> Option<&Arc<MessageMap>> {
        self.messages.get(locale)
    }

    pub fn lookup(
        &self,
        code: &str,
        locale: &Locale,
    ) -> Option<Arc<str>> {
        self.messages.get(locale)?.get(code).cloned()
    }
}

/// Live translation data
///
/// Mutation replaces the whole snapshot pointer; lookups never block on it.
pub struct TranslationCache {
    inner: ArcSwap<CacheSnapshot>,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationCache {
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(CacheSnapshot::default()),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        self.inner.load_full()
    }

    /// Swaps in a complete generation of data.
    pub fn install(
        &self,
        snapshot: CacheSnapshot,
    ) {
        for (locale, map) in &snapshot.messages {
            TRANSLATIONS_LOADED
                .with_label_values(&[&locale.to_string()])
                .set(map.len() as i64);
        }
        let previous = self.inner.swap(Arc::new(snapshot));
        debug!(previous_generation = previous.generation, "translation snapshot installed");
    }

    /// Replaces the map of a single locale, registering the locale if needed.
    pub fn replace_all(
        &self,
        locale: &Locale,
        map: MessageMap,
    ) {
        let map = Arc::new(map);
        TRANSLATIONS_LOADED
            .with_label_values(&[&locale.to_string()])
            .set(map.len() as i64);
        self.inner.rcu(|current| {
            let mut next = CacheSnapshot::clone(current);
            next.locales.insert(locale.clone());
            next.messages.insert(locale.clone(), map.clone());
            next
        });
    }

    pub fn lookup(
        &self,
        code: &str,
        locale: &Locale,
    ) -> Option<Arc<str>> {
        self.inner.load().lookup(code, locale)
    }

    /// Drops every locale and its translations.
    pub fn clear_all(&self) {
        let generation = self.inner.load().generation;
        self.inner.store(Arc::new(CacheSnapshot {
            generation,
            ..CacheSnapshot::default()
        }));
    }

    pub fn locales(&self) -> LocaleSet {
        self.inner.load().locales.clone()
    }

    /// First registered locale sharing the base language of `requested`
    pub fn match_locale(
        &self,
        requested: &Locale,
    ) -> Option<Locale> {
        self.inner.load().locales.find_match(requested).cloned()
    }

    pub fn generation(&self) -> u64 {
        self.inner.load().generation
    }
}
