//! Semaphore-bounded dispatch of CPU-bound work onto a blocking thread
//! pool (`spec.md` §5 "suspended-compatible" note, SPEC_FULL.md §8.4).
//!
//! The default zone loop runs harmonic analysis and loudness measurement
//! inline — a block's worth of either is cheap next to the sleep between
//! blocks. This type is exported for a host that wants that work off the
//! zone loop instead (denser block schedules, slower machines): wrap the
//! relevant closure in `AsyncOffload::run`. It is a thin wrapper around
//! `tokio::task::spawn_blocking`, not a general task-pool — a caller that
//! wants a different pool can build its own `AsyncOffload::with_permits`.

use std::sync::Arc;

use tokio::sync::{AcquireError, Semaphore};
use tokio::task::JoinError;

use crate::error::{MaestroError, Result};

/// Bounds how many offloaded closures run concurrently, independent of
/// tokio's own blocking-pool size.
pub struct AsyncOffload {
    permits: Arc<Semaphore>,
}

impl AsyncOffload {
    /// Default permit count: one per available CPU, at least one.
    pub fn new() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self::with_permits(n)
    }

    pub fn with_permits(permits: usize) -> Self {
        Self { permits: Arc::new(Semaphore::new(permits.max(1))) }
    }

    /// Runs `f` on the blocking pool, holding one permit for its duration.
    /// Propagates as `Fatal` only if the blocking task itself panicked or
    /// the semaphore was closed — neither should happen in practice since
    /// nothing ever calls `close()` on it.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(acquire_err)?;
        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f()
        })
        .await
        .map_err(join_err)?;
        Ok(result)
    }
}

impl Default for AsyncOffload {
    fn default() -> Self {
        Self::new()
    }
}

fn acquire_err(e: AcquireError) -> MaestroError {
    MaestroError::Fatal(format!("offload semaphore closed: {e}"))
}

fn join_err(e: JoinError) -> MaestroError {
    MaestroError::Fatal(format!("offloaded task failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_returns_closure_result() {
        let offload = AsyncOffload::new();
        let result = offload.run(|| 2 + 2).await.unwrap();
        assert_eq!(result, 4);
    }

    #[tokio::test]
    async fn test_bounded_permits_serialize_work() {
        let offload = Arc::new(AsyncOffload::with_permits(1));
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let offload = offload.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                offload
                    .run(move || {
                        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    })
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 4);
    }
}
