//! # Supervisor: runs a fixed set of tasks as one unit.
//!
//! ```text
//! Supervisor::run()
//!   spawn task[0] .. task[N-1] onto a JoinSet, each with the shared token
//!
//! task returns ──► settle():
//!                    ├─ Err(e) → first_error.set(e)   (later failures discarded)
//!                    └─ always → token.cancel()        (others start stopping)
//!
//! join_next() until the set is empty
//!   └─► first_error? → Err(SupervisorError) : Ok(())
//! ```
//!
//! ## Rules
//! - The token is cancelled by the first task to return, success or failure
//! - `run` never returns while a task is still running
//! - Exactly one error is reported even when several tasks fail at once
//! - A panic is caught and reported like any other failure

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use futures_util::FutureExt;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::task::{Task, TaskError, TaskResult};
use crate::observability::metrics;

/// The failure reported by [`Supervisor::run`].
#[derive(Debug, Error)]
#[error("task `{task}` failed: {source}")]
pub struct SupervisorError {
    /// Name of the task that failed first.
    pub task: String,
    #[source]
    pub source: TaskError,
}

/// Runs registered tasks concurrently under one cancellation token.
pub struct Supervisor {
    token: CancellationToken,
    tasks: Vec<Box<dyn Task>>,
}

impl Supervisor {
    /// Create a supervisor whose tasks share `token`.
    ///
    /// Cancelling the token from outside is equivalent to a task returning.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            tasks: Vec::new(),
        }
    }

    /// Register a task.
    pub fn with_task(mut self, task: impl Task) -> Self {
        self.add_task(task);
        self
    }

    pub fn add_task(&mut self, task: impl Task) {
        self.tasks.push(Box::new(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task to completion.
    ///
    /// Returns the failure of whichever task failed first, or `Ok(())` if
    /// none did.
    pub async fn run(self) -> Result<(), SupervisorError> {
        let Self { token, tasks } = self;
        let first_error: Arc<OnceLock<SupervisorError>> = Arc::new(OnceLock::new());
        let total = tasks.len();

        let mut set = JoinSet::new();
        for task in tasks {
            let name = task.name().to_owned();
            let fut = task.spawn(token.clone());
            let token = token.clone();
            let first_error = Arc::clone(&first_error);

            tracing::debug!(task = %name, "starting task");
            set.spawn(async move {
                let result = AssertUnwindSafe(fut)
                    .catch_unwind()
                    .await
                    .unwrap_or(Err(TaskError::Panicked));
                settle(&name, result, &first_error, &token);
            });
        }

        let mut completed = 0;
        while let Some(joined) = set.join_next().await {
            completed += 1;
            if let Err(e) = joined {
                tracing::error!(error = %e, "task wrapper aborted");
            }
            tracing::trace!(completed, total, "task joined");
        }

        // Every wrapper has been joined, so this is the last reference.
        match Arc::into_inner(first_error).and_then(OnceLock::into_inner) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Record one task's outcome and request everyone else to stop.
fn settle(
    name: &str,
    result: TaskResult,
    first_error: &OnceLock<SupervisorError>,
    token: &CancellationToken,
) {
    match result {
        Ok(completion) => {
            metrics::record_task_completion(name, completion.as_label());
            if completion.is_degraded() {
                tracing::warn!(task = %name, outcome = completion.as_label(), "task finished");
            } else {
                tracing::info!(task = %name, outcome = completion.as_label(), "task finished");
            }
        }
        Err(source) => {
            metrics::record_task_completion(name, source.as_label());
            tracing::error!(task = %name, error = %source, "task failed");
            let err = SupervisorError {
                task: name.to_owned(),
                source,
            };
            if let Err(later) = first_error.set(err) {
                tracing::debug!(task = %later.task, "discarding later failure");
            }
        }
    }
    // Record the error before cancelling so it wins over failures it causes.
    token.cancel();
}
