use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;
use tracing::warn;

use crate::CompiledFormat;
use crate::Locale;
use crate::FORMAT_CACHE_LOOKUPS;

type FormatKey = (String, Locale);

/// Lazily compiled formats keyed by (code, locale)
///
/// Every entry is tagged with the epoch it was compiled in. [`clear_all`]
/// bumps the epoch before dropping entries, so a compile that started against
/// old translation data can never be served after the clear.
///
/// [`clear_all`]: FormatCache::clear_all
#[derive(Default)]
pub struct FormatCache {
    epoch: AtomicU64,
    entries: DashMap<FormatKey, (u64, Arc<CompiledFormat>)>,
}

impl FormatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached format, or compiles the template yielded by
    /// `template_supplier`.
    ///
    /// Absent templates are not cached. A template that fails to compile is
    /// logged and treated as absent.
    pub fn get_or_create<F>(
        &self,
        code: &str,
        locale: &Locale,
        template_supplier: F,
    ) -> Option<Arc<CompiledFormat>>
    where
        F: FnOnce() -> Option<Arc<str>>,
    {
        let epoch = self.epoch.load(Ordering::Acquire);
        let key = (code.to_string(), locale.clone());

        if let Some(entry) = self.entries.get(&key) {
            let (entry_epoch, format) = entry.value();
            if *entry_epoch == epoch {
                FORMAT_CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
                return Some(format.clone());
            }
        }
        FORMAT_CACHE_LOOKUPS.with_label_values(&["miss"]).inc();

        let template = template_supplier()?;
        let format = match CompiledFormat::compile(&template, locale) {
            Ok(f) => Arc::new(f),
            Err(e) => {
                warn!(code, %locale, "template does not compile, treating as absent: {}", e);
                return None;
            }
        };
        trace!(code, %locale, epoch, "compiled format");

        // Concurrent misses race benignly: the first insert of this epoch wins
        // and every caller gets that instance.
        let mut slot = self
            .entries
            .entry(key)
            .or_insert_with(|| (epoch, format.clone()));
        if slot.0 < epoch {
            *slot = (epoch, format.clone());
        }
        let cached = slot.1.clone();
        drop(slot);

        if self.epoch.load(Ordering::Acquire) != epoch {
            // Cleared while compiling.
            return Some(format);
        }
        Some(cached)
    }

    /// Drops every compiled format.
    pub fn clear_all(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
