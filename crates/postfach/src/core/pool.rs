//! Bounded worker pool for page-level work.
//!
//! Every task gets an index and delivers exactly one outcome for it. The
//! collector stores outcomes into a pre-sized buffer by index, so the returned
//! vector is always in task order no matter which worker finished first.
//!
//! The join waits at most until the configured deadline. Slots that have not
//! reported by then come back as [`TaskOutcome::TimedOut`]; the stalled worker
//! is left to finish on its own and its late result is discarded.

use crate::{PostfachError, Result};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

/// No pool ever runs more threads than this, whatever the configuration says.
pub const HARD_WORKER_CEILING: usize = 8;

/// min(requested, CPU count, ceiling), never below one.
pub fn effective_workers(requested: usize) -> usize {
    requested.min(num_cpus::get()).min(HARD_WORKER_CEILING).max(1)
}

/// Result of one indexed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T> {
    Done(T),
    Failed(String),
    TimedOut,
}

impl<T> TaskOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    deadline: Duration,
}

impl WorkerPool {
    pub fn new(requested_workers: usize, deadline: Duration) -> Self {
        Self {
            workers: effective_workers(requested_workers),
            deadline,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run `task(i)` for every `i` in `0..count` and return the outcomes in index order.
    ///
    /// Errors and panics inside a task become [`TaskOutcome::Failed`] for that
    /// index only. The only error returned here is a failure to start the pool.
    pub fn run_indexed<T, E, F>(&self, count: usize, task: F) -> Result<Vec<TaskOutcome<T>>>
    where
        T: Send + 'static,
        E: std::fmt::Display,
        F: Fn(usize) -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        if count == 0 {
            return Ok(Vec::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers.min(count))
            .thread_name(|i| format!("postfach-worker-{}", i))
            .build()
            .map_err(|e| PostfachError::extraction_with_source("failed to start worker pool", e))?;

        let task = Arc::new(task);
        let (tx, rx) = mpsc::channel::<(usize, TaskOutcome<T>)>();

        for index in 0..count {
            let tx = tx.clone();
            let task = Arc::clone(&task);
            pool.spawn(move || {
                let outcome = match panic::catch_unwind(AssertUnwindSafe(|| task(index))) {
                    Ok(Ok(value)) => TaskOutcome::Done(value),
                    Ok(Err(e)) => TaskOutcome::Failed(e.to_string()),
                    Err(_) => TaskOutcome::Failed(format!("task {} panicked", index)),
                };
                // Receiver is gone once the deadline passed.
                let _ = tx.send((index, outcome));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<TaskOutcome<T>>> = (0..count).map(|_| None).collect();
        // A deadline past the clock's range means wait for every task.
        let deadline = Instant::now().checked_add(self.deadline);
        let mut filled = 0;

        while filled < count {
            let received = match deadline {
                Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok((index, outcome)) => {
                    if let Some(slot) = slots.get_mut(index)
                        && slot.is_none()
                    {
                        *slot = Some(outcome);
                        filled += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        pending = count - filled,
                        deadline_secs = self.deadline.as_secs(),
                        "Worker pool deadline reached, abandoning unfinished tasks"
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Ok(slots
            .into_iter()
            .map(|slot| slot.unwrap_or(TaskOutcome::TimedOut))
            .collect())
    }
}
