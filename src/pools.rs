//! Execution pools
//!
//! Store calls are short and non-blocking and run on the `store` runtime.
//! Bulk loads, reload orchestration and watch-batch handling are long-running
//! and run on the `blocking` runtime so they never stall store I/O or the
//! watch delivery stream.
//!
//! [`TaskPools`] only holds runtime handles. The runtimes themselves are owned
//! by whoever built them (the binary's `main`, or the test harness), which
//! keeps runtime shutdown out of async contexts.

use tokio::runtime::Builder;
use tokio::runtime::Handle;
use tokio::runtime::Runtime;

use crate::PoolConfig;
use crate::Result;

#[derive(Debug, Clone)]
pub struct TaskPools {
    store: Handle,
    blocking: Handle,
}

impl TaskPools {
    pub fn new(
        store: Handle,
        blocking: Handle,
    ) -> Self {
        Self { store, blocking }
    }

    /// Both pools mapped onto the runtime the caller is running in.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        let handle = Handle::current();
        Self {
            store: handle.clone(),
            blocking: handle,
        }
    }

    pub fn store(&self) -> &Handle {
        &self.store
    }

    pub fn blocking(&self) -> &Handle {
        &self.blocking
    }
}

/// Builds the two multi-threaded runtimes described by `config`.
///
/// Returns `(store_runtime, blocking_runtime)`.
pub fn build_runtimes(config: &PoolConfig) -> Result<(Runtime, Runtime)> {
    let store = Builder::new_multi_thread()
        .worker_threads(config.store_worker_threads)
        .thread_name(config.store_thread_name.clone())
        .enable_all()
        .build()?;
    let blocking = Builder::new_multi_thread()
        .worker_threads(config.blocking_worker_threads)
        .thread_name(config.blocking_thread_name.clone())
        .enable_all()
        .build()?;
    Ok((store, blocking))
}
