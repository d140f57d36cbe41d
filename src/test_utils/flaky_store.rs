use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::KvStore;
use crate::MemoryStore;
use crate::Mutation;
use crate::StoreError;
use crate::StoreResult;
use crate::WatchSink;

/// [`MemoryStore`] wrapper that can fail or hold back reads.
///
/// - prefixes registered with [`fail_prefix`](Self::fail_prefix) make range
///   reads under them fail with [`StoreError::Unavailable`]
/// - [`close_gate`](Self::close_gate) parks every range read until
///   [`open_gate`](Self::open_gate)
/// - [`write_after_read`](Self::write_after_read) applies a write right
///   after a range read returned its data
/// - point and range reads are counted
pub struct FlakyStore {
    inner: MemoryStore,
    failing: Mutex<HashSet<String>>,
    after_read: Mutex<Option<(String, Mutation)>>,
    gate: watch::Sender<bool>,
    gets: AtomicUsize,
    range_reads: AtomicUsize,
    parked: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            after_read: Mutex::new(None),
            gate,
            gets: AtomicUsize::new(0),
            range_reads: AtomicUsize::new(0),
            parked: AtomicUsize::new(0),
        }
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn fail_prefix(
        &self,
        prefix: &str,
    ) {
        self.failing.lock().insert(prefix.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().clear();
    }

    /// Applies `mutation` once, after the next range read under `prefix`.
    pub fn write_after_read(
        &self,
        prefix: &str,
        mutation: Mutation,
    ) {
        *self.after_read.lock() = Some((prefix.to_string(), mutation));
    }

    pub fn close_gate(&self) {
        self.gate.send_replace(false);
    }

    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    /// Point reads issued so far (one per pipeline run: the locales key)
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn range_read_count(&self) -> usize {
        self.range_reads.load(Ordering::SeqCst)
    }

    /// Range reads currently waiting on a closed gate
    pub fn parked_count(&self) -> usize {
        self.parked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KvStore for FlakyStore {
    async fn get(
        &self,
        key: &str,
    ) -> StoreResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn get_range(
        &self,
        key: &str,
        is_prefix: bool,
    ) -> StoreResult<BTreeMap<String, String>> {
        self.range_reads.fetch_add(1, Ordering::SeqCst);

        let mut gate = self.gate.subscribe();
        if !*gate.borrow() {
            self.parked.fetch_add(1, Ordering::SeqCst);
            let _ = gate.wait_for(|open| *open).await;
            self.parked.fetch_sub(1, Ordering::SeqCst);
        }

        let failing = self.failing.lock().iter().any(|p| key.starts_with(p.as_str()));
        if failing {
            return Err(StoreError::Unavailable(format!("injected failure for {key}")));
        }
        let read = self.inner.get_range(key, is_prefix).await;

        let write = {
            let mut after_read = self.after_read.lock();
            match after_read.as_ref() {
                Some((prefix, _)) if key.starts_with(prefix.as_str()) => after_read.take(),
                _ => None,
            }
        };
        if let Some((_, mutation)) = write {
            self.inner.apply(vec![mutation]);
        }
        read
    }

    fn watch_prefix(
        &self,
        prefix: &str,
        sink: WatchSink,
    ) -> StoreResult<()> {
        self.inner.watch_prefix(prefix, sink)
    }

    fn stop_watcher(&self) {
        self.inner.stop_watcher()
    }
}
