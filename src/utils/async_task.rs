use std::future::Future;

use tokio::time::sleep;
use tokio::time::timeout;
use tracing::error;
use tracing::warn;

use crate::BackoffPolicy;
use crate::StoreError;

/// Runs `task` until it succeeds, retrying with exponential backoff.
///
/// Each attempt is bounded by `policy.timeout_ms`; the delay between attempts
/// starts at `policy.base_delay_ms` and doubles up to `policy.max_delay_ms`.
/// After `policy.max_retries` failed attempts the last error is returned
/// wrapped in [`StoreError::RetryExhausted`].
pub(crate) async fn task_with_timeout_and_exponential_backoff<F, T, P>(
    task: F,
    policy: BackoffPolicy,
) -> std::result::Result<P, StoreError>
where
    F: Fn() -> T,
    T: Future<Output = std::result::Result<P, StoreError>>,
{
    let max_retries = policy.max_retries.max(1);
    let mut delay = policy.base_delay();
    let mut last = StoreError::Unavailable("task never ran".to_string());

    for attempt in 1..=max_retries {
        match timeout(policy.timeout(), task()).await {
            Ok(Ok(r)) => return Ok(r),
            Ok(Err(e)) => {
                warn!(attempt, "store task failed: {}", e);
                last = e;
            }
            Err(_) => {
                warn!(attempt, "store task timed out after {:?}", policy.timeout());
                last = StoreError::Timeout(policy.timeout());
            }
        }

        if attempt < max_retries {
            sleep(delay).await;
            delay = (delay * 2).min(policy.max_delay());
        }
    }

    warn!("Task failed after {} retries", max_retries);
    Err(StoreError::RetryExhausted {
        attempts: max_retries,
        last: Box::new(last),
    })
}

/// Spawns a named task on `handle`, logging its error instead of dropping it.
pub(crate) fn spawn_task<F>(
    handle: &tokio::runtime::Handle,
    name: &str,
    task: F,
) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = crate::Result<()>> + Send + 'static,
{
    let name = name.to_string();
    handle.spawn(async move {
        if let Err(e) = task.await {
            error!("spawned task: {name} stopped or encountered an error: {:?}", e);
        }
    })
}
