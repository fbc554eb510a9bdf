//! Running blocking adapter work off the async runtime, with an optional deadline.

use std::time::Duration;

use imgsim_core::{Error, Result};

/// Run `f` on the blocking pool.
///
/// On timeout the caller gets `Error::Timeout` immediately, but the blocking
/// task is not cancelled: a hung adapter keeps its blocking-pool thread until
/// `embed` returns, and its result is then discarded.
pub async fn run_blocking<T, F>(timeout: Option<Duration>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(f);
    let joined = match timeout {
        Some(d) => tokio::time::timeout(d, task).await.map_err(|_| Error::Timeout(d))?,
        None => task.await,
    };
    joined.map_err(|e| Error::InferenceFailure(format!("adapter task failed: {e}")))?
}
