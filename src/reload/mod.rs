//! Reload coordination
//!
//! [`ReloadCoordinator`] owns the reload state machine:
//!
//! ```text
//! Idle -> Loading -> Ready
//!            |  ^------'  (re-entrant on trigger)
//!            '-> Failed { failed_locales }
//! ```
//!
//! At most one pipeline runs at a time. Triggers arriving while one runs are
//! folded into a single follow-up run. Every trigger bumps the requested
//! generation and a finished pipeline only commits when its generation is
//! still the newest one requested.

mod pipeline;

pub use pipeline::*;


use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::utils::async_task::spawn_task;
use crate::Error;
use crate::FormatCache;
use crate::ReloadMode;
use crate::TaskPools;
use crate::TranslationCache;
use crate::RELOAD_DURATION_MS;
use crate::RELOAD_TOTAL;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReloadState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// Some locales could not be refreshed; previously committed data keeps
    /// serving lookups.
    Failed { failed_locales: Vec<String> },
}

/// Published on every state transition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReloadStatus {
    pub state: ReloadState,
    /// Generation of the last committed reload
    pub generation: u64,
}

enum RunOutcome {
    Settled,
    Skipped,
}

pub struct ReloadCoordinator {
    pipeline: ReloadPipeline,
    cache: Arc<TranslationCache>,
    formats: Arc<FormatCache>,
    pools: TaskPools,

    requested: AtomicU64,
    running: AtomicBool,
    stopped: AtomicBool,

    status_tx: watch::Sender<ReloadStatus>,
}

impl ReloadCoordinator {
    pub fn new(
        pipeline: ReloadPipeline,
        cache: Arc<TranslationCache>,
        formats: Arc<FormatCache>,
        pools: TaskPools,
    ) -> Self {
        let (status_tx, _) = watch::channel(ReloadStatus::default());
        Self {
            pipeline,
            cache,
            formats,
            pools,
            requested: AtomicU64::new(0),
            running: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            status_tx,
        }
    }

    pub fn status(&self) -> ReloadStatus {
        self.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReloadStatus> {
        self.status_tx.subscribe()
    }

    /// Newest generation requested so far
    pub fn requested_generation(&self) -> u64 {
        self.requested.load(Ordering::Acquire)
    }

    /// Requests a reload.
    ///
    /// In [`ReloadMode::Sync`] the pipeline runs on the caller's task and this
    /// returns once it settled. In [`ReloadMode::Async`] it is spawned on the
    /// blocking pool. Either way, when a reload is already running the
    /// request is absorbed into that reload's single follow-up run.
    pub async fn trigger(
        self: &Arc<Self>,
        mode: ReloadMode,
    ) {
        if self.stopped.load(Ordering::Acquire) {
            debug!("reload coordinator stopped, ignoring trigger");
            return;
        }

        let generation = self.requested.fetch_add(1, Ordering::AcqRel) + 1;
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(generation, "reload in flight, trigger coalesced");
            return;
        }

        match mode {
            ReloadMode::Sync => self.drive(mode).await,
            ReloadMode::Async => {
                let this = self.clone();
                spawn_task(self.pools.blocking(), "reload", async move {
                    this.drive(mode).await;
                    Ok(())
                });
            }
        }
    }

    /// Stops follow-up runs. A reload already in flight may still commit.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            info!("reload coordinator stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Runs pipelines until no newer generation is pending. Caller must hold
    /// the `running` flag.
    async fn drive(
        &self,
        mode: ReloadMode,
    ) {
        loop {
            let target = self.requested.load(Ordering::Acquire);
            let outcome = self.run_once(target, mode).await;

            if self.stopped.load(Ordering::Acquire) {
                if matches!(outcome, RunOutcome::Skipped) {
                    self.publish(ReloadState::Idle);
                }
                self.running.store(false, Ordering::Release);
                return;
            }
            if self.requested.load(Ordering::Acquire) != target {
                debug!(target, "newer reload requested, running follow-up");
                continue;
            }

            self.running.store(false, Ordering::Release);
            // A trigger may have slipped in between the check and the release.
            if self.requested.load(Ordering::Acquire) == target
                || self
                    .running
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
            {
                return;
            }
        }
    }

    async fn run_once(
        &self,
        generation: u64,
        mode: ReloadMode,
    ) -> RunOutcome {
        let started = Instant::now();
        info!(generation, mode = mode.as_str(), "reload started");
        self.publish(ReloadState::Loading);

        let previous = self.cache.snapshot();
        let staged = match self.pipeline.run(&previous, generation).await {
            Ok(staged) => staged,
            Err(e) => {
                error!(generation, "reload aborted, previous data keeps serving: {}", e);
                let failed_locales = match e {
                    Error::DirectoryCollision { first, second, .. } => vec![first, second],
                    _ => Vec::new(),
                };
                RELOAD_TOTAL.with_label_values(&["failed"]).inc();
                self.observe_duration(started, mode);
                self.publish(ReloadState::Failed { failed_locales });
                return RunOutcome::Settled;
            }
        };

        if self.requested.load(Ordering::Acquire) != generation {
            info!(generation, "newer reload requested, skipping commit");
            RELOAD_TOTAL.with_label_values(&["skipped"]).inc();
            self.observe_duration(started, mode);
            return RunOutcome::Skipped;
        }

        let failed = staged.failed.clone();
        self.cache.install(staged.snapshot);
        self.formats.clear_all();
        self.observe_duration(started, mode);

        if failed.is_empty() {
            RELOAD_TOTAL.with_label_values(&["ready"]).inc();
            info!(generation, "reload committed");
            self.publish(ReloadState::Ready);
        } else {
            RELOAD_TOTAL.with_label_values(&["partial"]).inc();
            warn!(
                generation,
                "{}",
                Error::ReloadFailed {
                    failed: failed.clone()
                }
            );
            self.publish(ReloadState::Failed { failed_locales: failed });
        }
        RunOutcome::Settled
    }

    fn observe_duration(
        &self,
        started: Instant,
        mode: ReloadMode,
    ) {
        RELOAD_DURATION_MS
            .with_label_values(&[mode.as_str()])
            .observe(started.elapsed().as_secs_f64() * 1000.0);
    }

    fn publish(
        &self,
        state: ReloadState,
    ) {
        let generation = self.cache.generation();
        self.status_tx.send_replace(ReloadStatus { state, generation });
    }
}
