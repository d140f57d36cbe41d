//! In-memory caches
//!
//! - [`TranslationCache`]: locale to (code to raw template), swapped
//!   atomically. Readers always work against a stable snapshot.
//! - [`FormatCache`]: (code, locale) to compiled format, lazily filled and
//!   dropped wholesale whenever translation content may have changed.

mod format_cache;
mod translation_cache;

pub use format_cache::*;
pub use translation_cache::*;
