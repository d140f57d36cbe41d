//! Key-value store client seam
//!
//! The translator never talks to a concrete store directly. Everything it
//! needs from the backing key-value store is captured by [`KvStore`]:
//! - point reads of a single key
//! - range reads of every key under a prefix
//! - a long-lived prefix watch delivering ordered change batches
//! - an idempotent way to stop that watch
//!
//! Watch delivery is modeled as a channel instead of a callback: the store
//! pushes every [`WatchBatch`] into the [`WatchSink`] it was handed, and a
//! single consumer task on the translator side decides whether a batch should
//! trigger a reload.
//!
//! [`MemoryStore`] is an in-process implementation used by the binary and by
//! tests.

mod memory;

pub use memory::*;


use std::collections::BTreeMap;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

use crate::StoreError;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Type of a single change reported by a watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventType {
    /// Key was inserted or updated
    Put,
    /// Key was deleted
    Delete,
    /// Any other notification the store may emit (progress, compaction, ...)
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub key: String,
    pub event_type: WatchEventType,
}

impl WatchEvent {
    pub fn new(
        key: impl Into<String>,
        event_type: WatchEventType,
    ) -> Self {
        Self {
            key: key.into(),
            event_type,
        }
    }

    /// Inserts and deletes may change translation content
    pub fn is_content_change(&self) -> bool {
        matches!(self.event_type, WatchEventType::Put | WatchEventType::Delete)
    }
}

/// Events delivered together by one watch notification
pub type WatchBatch = Vec<WatchEvent>;

/// Receiving end of a prefix watch
pub type WatchSink = mpsc::UnboundedSender<WatchBatch>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` when absent.
    async fn get(
        &self,
        key: &str,
    ) -> StoreResult<Option<String>>;

    /// Returns all key/value pairs for `key`.
    ///
    /// With `is_prefix == false` this holds at most one pair; otherwise every
    /// key starting with `key` is returned.
    async fn get_range(
        &self,
        key: &str,
        is_prefix: bool,
    ) -> StoreResult<BTreeMap<String, String>>;

    /// Starts delivering change batches for keys under `prefix` into `sink`.
    fn watch_prefix(
        &self,
        prefix: &str,
        sink: WatchSink,
    ) -> StoreResult<()>;

    /// Stops every watch started through this client.
    ///
    /// Calling this without an active watch, or more than once, is a no-op.
    fn stop_watcher(&self);
}
