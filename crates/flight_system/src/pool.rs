//! Bounded worker pool.
//!
//! Every delivery runs on its own tokio task, but at most `size` run at
//! once: [`WorkerPool::spawn`] waits for a semaphore permit before
//! spawning, which back-pressures the subscription loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::error::RunnerError;

/// A semaphore-bounded set of handler tasks.
#[derive(Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    tasks: JoinSet<()>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool allowing `size` concurrent tasks (at least one).
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            tasks: JoinSet::new(),
            size,
        }
    }

    /// The concurrency limit.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Tasks spawned and not yet reaped.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for a free slot, then run `task` on it.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::PoolClosed`] if the semaphore was closed.
    pub async fn spawn<F>(&mut self, task: F) -> Result<(), RunnerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| RunnerError::PoolClosed)?;
        self.tasks.spawn(async move {
            task.await;
            drop(permit);
        });
        self.reap();
        Ok(())
    }

    /// Collect finished tasks without waiting.
    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                error!(error = %e, "handler task failed");
            }
        }
    }

    /// Wait for every in-flight task, bounded by `timeout`. Tasks still
    /// running when it elapses are aborted.
    ///
    /// Returns the number of tasks that finished.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::DrainTimeout`] if the timeout elapsed.
    pub async fn drain(&mut self, timeout: Duration) -> Result<usize, RunnerError> {
        let tasks = &mut self.tasks;
        let joined = tokio::time::timeout(timeout, async {
            let mut finished = 0;
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    error!(error = %e, "handler task failed");
                }
                finished += 1;
            }
            finished
        })
        .await;

        match joined {
            Ok(finished) => Ok(finished),
            Err(_) => {
                let remaining = self.tasks.len();
                warn!(remaining, "drain timed out, aborting handlers");
                self.tasks.abort_all();
                Err(RunnerError::DrainTimeout { remaining })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_drain_waits_for_all_tasks() {
        let mut pool = WorkerPool::new(2);
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..6 {
            let done = Arc::clone(&done);
            pool.spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                done.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }
        pool.drain(Duration::from_secs(5)).await.unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 6);
        assert_eq!(pool.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let mut pool = WorkerPool::new(3);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        for _ in 0..12 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            pool.spawn(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }
        pool.drain(Duration::from_secs(5)).await.unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_drain_timeout_aborts() {
        let mut pool = WorkerPool::new(1);
        pool.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        })
        .await
        .unwrap();
        let err = pool.drain(Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, RunnerError::DrainTimeout { remaining: 1 }));
    }

    #[test]
    fn test_zero_size_is_raised() {
        assert_eq!(WorkerPool::new(0).size(), 1);
    }
}
