//! Locale-aware translation cache over a watched key-value store.
//!
//! Per-locale maps of message code to template are bulk-loaded from the
//! store, kept in memory, compiled lazily into [`CompiledFormat`]s and
//! reloaded whenever the watched prefix changes.
//!
//! ```ignore
//! let translator = Translator::new(store, &config, TaskPools::current());
//! translator.start().await?;
//! let hello = translator.message("greet.hello", &["World"], &"en".parse()?)?;
//! ```

mod cache;
mod config;
mod directory;
mod errors;
mod loader;
mod locale;
mod metrics;
mod pools;
mod registry;
mod reload;
mod store;
mod template;
mod translator;
mod watcher;
pub mod http;
pub(crate) mod utils;

pub use cache::*;
pub use config::*;
pub use directory::*;
pub use errors::*;
pub use loader::*;
pub use locale::*;
pub use metrics::*;
pub use pools::*;
pub use registry::*;
pub use reload::*;
pub use store::*;
pub use template::*;
pub use translator::*;
pub use watcher::*;

#[cfg(test)]
mod translator_test;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
