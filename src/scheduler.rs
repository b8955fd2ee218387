//! Bounded task scheduler for remote translation work.
//! A fixed number of permits caps concurrency across all callers; every task
//! runs under its own timeout so one slow item never holds up its siblings.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::TaskError;

/// Process-wide worker budget, created once and shared by every batch.
pub struct Scheduler {
    permits: Arc<Semaphore>,
    workers: usize,
    item_timeout: Duration,
}

impl Scheduler {
    pub fn new(workers: usize, item_timeout: Duration) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            item_timeout,
        }
    }

    /// Queue `task`. It starts once a worker permit is free and is abandoned
    /// if it runs longer than the item timeout.
    pub fn submit<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let item_timeout = self.item_timeout;

        let join = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| TaskError::Closed)?;
            tokio::time::timeout(item_timeout, task)
                .await
                .map_err(|_| TaskError::TimedOut)
        });

        TaskHandle { join }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Permits not currently held by a running task.
    pub fn idle_workers(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn item_timeout(&self) -> Duration {
        self.item_timeout
    }
}

/// Handle to one submitted task.
pub struct TaskHandle<T> {
    join: JoinHandle<Result<T, TaskError>>,
}

impl<T> TaskHandle<T> {
    /// Wait for the task. Bounded by the scheduler's item timeout once the
    /// task has started.
    pub async fn wait(self) -> Result<T, TaskError> {
        match self.join.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                warn!("scheduled task panicked");
                Err(TaskError::Panicked)
            }
            Err(_) => Err(TaskError::Closed),
        }
    }

    /// Wait at most `limit`, counting queueing time. On expiry the task is
    /// aborted; other handles are unaffected.
    pub async fn wait_timeout(self, limit: Duration) -> Result<T, TaskError> {
        let abort = self.join.abort_handle();
        match tokio::time::timeout(limit, self.wait()).await {
            Ok(result) => result,
            Err(_) => {
                debug!(limit_ms = limit.as_millis() as u64, "task wait expired, aborting");
                abort.abort();
                Err(TaskError::TimedOut)
            }
        }
    }
}
