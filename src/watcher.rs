//! Watch-driven reload triggering.
//!
//! One subscription on the watched prefix feeds a channel. A single consumer
//! task on the blocking pool drains it and triggers the coordinator once per
//! qualifying batch. Batches that pile up while a reload runs are folded into
//! one trigger.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::select;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::trace;

use crate::utils::async_task::spawn_task;
use crate::KvStore;
use crate::ReloadCoordinator;
use crate::ReloadMode;
use crate::Result;
use crate::TaskPools;
use crate::WatchBatch;
use crate::WATCH_BATCHES;

/// Whether `batch` holds at least one insert or delete
pub fn is_qualifying(batch: &WatchBatch) -> bool {
    batch.iter().any(|e| e.is_content_change())
}

pub struct ChangeWatcher {
    store: Arc<dyn KvStore>,
    token: CancellationToken,
    stopped: AtomicBool,
    consumer: JoinHandle<()>,
}

/// Subscription registered on the store whose consumer has not started yet.
///
/// Batches delivered in the meantime stay queued and are handled once
/// [`spawn`](Self::spawn) starts the consumer.
pub struct PendingWatch {
    store: Arc<dyn KvStore>,
    rx: mpsc::UnboundedReceiver<WatchBatch>,
}

impl PendingWatch {
    pub fn spawn(
        self,
        coordinator: Arc<ReloadCoordinator>,
        mode: ReloadMode,
        pools: &TaskPools,
    ) -> ChangeWatcher {
        let token = CancellationToken::new();
        let consumer = spawn_task(
            pools.blocking(),
            "watch-consumer",
            consume(self.rx, coordinator, mode, token.clone()),
        );
        ChangeWatcher {
            store: self.store,
            token,
            stopped: AtomicBool::new(false),
            consumer,
        }
    }
}

impl ChangeWatcher {
    /// Registers the subscription on `prefix` without consuming it yet.
    pub fn subscribe(
        store: Arc<dyn KvStore>,
        prefix: &str,
    ) -> Result<PendingWatch> {
        let (tx, rx) = mpsc::unbounded_channel();
        store.watch_prefix(prefix, tx)?;
        info!(prefix, "watch established");
        Ok(PendingWatch { store, rx })
    }

    /// Subscribes to `prefix` and starts the batch consumer.
    pub fn start(
        store: Arc<dyn KvStore>,
        prefix: &str,
        coordinator: Arc<ReloadCoordinator>,
        mode: ReloadMode,
        pools: &TaskPools,
    ) -> Result<Self> {
        Ok(Self::subscribe(store, prefix)?.spawn(coordinator, mode, pools))
    }

    /// Stops the subscription and the consumer. Safe to call repeatedly.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            trace!("watch already stopped");
            return;
        }
        self.token.cancel();
        self.store.stop_watcher();
        info!("watch stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.consumer.is_finished()
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn consume(
    mut rx: mpsc::UnboundedReceiver<WatchBatch>,
    coordinator: Arc<ReloadCoordinator>,
    mode: ReloadMode,
    token: CancellationToken,
) -> Result<()> {
    loop {
        let batch = select! {
            _ = token.cancelled() => break,
            batch = rx.recv() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };

        let mut qualifying = record(&batch);
        // Fold whatever queued up behind this batch into the same trigger.
        while let Ok(next) = rx.try_recv() {
            qualifying |= record(&next);
        }

        if qualifying {
            coordinator.trigger(mode).await;
        }
    }
    debug!("watch consumer exited");
    Ok(())
}

fn record(batch: &WatchBatch) -> bool {
    let qualifying = is_qualifying(batch);
    if qualifying {
        WATCH_BATCHES.with_label_values(&["true"]).inc();
    } else {
        trace!(events = batch.len(), "ignoring batch without insert or delete");
        WATCH_BATCHES.with_label_values(&["false"]).inc();
    }
    qualifying
}
