//! Translation Cache Error Hierarchy
//!
//! Defines the error types surfaced by the translator, categorized by the
//! layer that produces them: the backing key-value store, configuration,
//! template compilation and the reload pipeline.
//!
//! Only [`Error::LocaleNotSupported`] is ever returned from a lookup. Store
//! failures are absorbed by the reload pipeline and degrade to fallbacks.

use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Backing key-value store failures (network, timeouts, watch)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Lookup against a locale that is not in the registered locale set
    #[error("Locale not supported: {0}")]
    LocaleNotSupported(String),

    /// One or more per-locale loads failed during a reload
    #[error("Reload failed for locales: {}", failed.join(","))]
    ReloadFailed { failed: Vec<String> },

    /// Two distinct locales resolved to the same store directory
    #[error("Locales {first} and {second} both resolve to directory {directory}")]
    DirectoryCollision {
        first: String,
        second: String,
        directory: String,
    },

    /// Template parsing failures
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Local file I/O failures (seed file, log directory)
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Background task panicked or was aborted
    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),

    #[error("{0}")]
    SignalSenderClosed(String),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Endpoint unavailable or request rejected
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Single request exceeded its deadline
    #[error("Store request timed out after {0:?}")]
    Timeout(Duration),

    /// Watch subscription could not be established
    #[error("Watch failed: {0}")]
    WatchFailed(String),

    /// Retry policy exhaustion
    #[error("Store request failed after {attempts} attempts: {last}")]
    RetryExhausted { attempts: usize, last: Box<StoreError> },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// `{` without matching `}` or a stray `}`
    #[error("Unmatched brace at position {position}")]
    UnmatchedBrace { position: usize },

    /// Placeholder whose index is not a non-negative integer
    #[error("Invalid argument index {text:?} at position {position}")]
    InvalidArgumentIndex { position: usize, text: String },

    /// Quoted literal run never closed
    #[error("Unterminated quoted literal")]
    UnterminatedQuote,
}

impl StoreError {
    /// Returns the innermost error when retries were exhausted
    pub fn root_cause(&self) -> &StoreError {
        match self {
            StoreError::RetryExhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}
