//! # Task abstraction and function-backed task implementation.
//!
//! A [`Task`] is a named unit of work that receives the supervisor's shared
//! [`CancellationToken`] and runs until it finishes or observes cancellation.
//! [`TaskFn`] wraps a closure `F: FnOnce(CancellationToken) -> Fut`.
//!
//! ## Example
//! ```rust
//! use graceful_server::lifecycle::{Completion, Task, TaskError, TaskFn};
//! use tokio_util::sync::CancellationToken;
//!
//! let task = TaskFn::new("worker", |ctx: CancellationToken| async move {
//!     ctx.cancelled().await;
//!     Ok::<_, TaskError>(Completion::Finished)
//! });
//! assert_eq!(task.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::net::ListenerError;

/// How a task finished when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Work ran to completion on its own.
    Finished,
    /// The listener stopped because accepting was explicitly stopped.
    Stopped,
    /// A termination signal arrived and shutdown was requested.
    SignalReceived,
    /// Another task initiated shutdown first.
    ContextDone,
    /// All in-flight connections finished within the grace period.
    Drained,
    /// The grace period elapsed and remaining connections were dropped.
    ForceClosed,
}

impl Completion {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Completion::Finished => "finished",
            Completion::Stopped => "stopped",
            Completion::SignalReceived => "signal_received",
            Completion::ContextDone => "context_done",
            Completion::Drained => "drained",
            Completion::ForceClosed => "force_closed",
        }
    }

    /// Shutdown completed, but not gracefully.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Completion::ForceClosed)
    }
}

/// Errors produced by task execution.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Bind failure or unexpected I/O on the listening socket.
    #[error("listener fault: {0}")]
    Listener(#[from] ListenerError),

    /// Signal handlers could not be registered.
    #[error("failed to register signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    /// The task panicked.
    #[error("task panicked")]
    Panicked,

    /// Task-specific failure.
    #[error("execution failed: {error}")]
    Fail { error: String },
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Listener(_) => "listener_fault",
            TaskError::Signal(_) => "signal_registration",
            TaskError::Panicked => "task_panicked",
            TaskError::Fail { .. } => "task_failed",
        }
    }
}

pub type TaskResult = Result<Completion, TaskError>;

/// Boxed future returned by [`Task::spawn`].
pub type TaskFuture = Pin<Box<dyn Future<Output = TaskResult> + Send + 'static>>;

/// A unit of work owned by the supervisor for the duration of one run.
pub trait Task: Send + 'static {
    fn name(&self) -> &str;

    /// Consume the task and produce its future.
    ///
    /// The future must return once `ctx` is cancelled.
    fn spawn(self: Box<Self>, ctx: CancellationToken) -> TaskFuture;
}

/// Function-backed [`Task`].
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F, Fut> Task for TaskFn<F>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(self: Box<Self>, ctx: CancellationToken) -> TaskFuture {
        Box::pin((self.f)(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn task_fn_runs_closure_with_token() {
        let task: Box<dyn Task> = Box::new(TaskFn::new("heartbeat", |ctx: CancellationToken| async move {
            assert!(ctx.is_cancelled());
            Ok::<_, TaskError>(Completion::ContextDone)
        }));
        assert_eq!(task.name(), "heartbeat");

        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(task.spawn(token).await.unwrap(), Completion::ContextDone);
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(Completion::ForceClosed.as_label(), "force_closed");
        assert!(Completion::ForceClosed.is_degraded());
        assert!(!Completion::Drained.is_degraded());
        assert_eq!(TaskError::Panicked.as_label(), "task_panicked");
        assert_eq!(
            TaskError::Fail { error: "boom".into() }.to_string(),
            "execution failed: boom"
        );
    }
}
