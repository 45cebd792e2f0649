//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT/SIGTERM handlers (ctrl-c elsewhere)
//! - Turn the first delivered signal into cancellation of the shared token
//! - Stand down quietly when another task started shutdown first
//!
//! Signal streams live inside the watcher's future and are dropped as soon as
//! it returns, so a stale watcher never receives a later signal.

use std::future::Future;
use std::io;

use tokio_util::sync::CancellationToken;

use crate::lifecycle::task::{Completion, Task, TaskError, TaskFn, TaskResult};

/// Task name used in logs and errors.
pub const SIGNAL_TASK: &str = "signals";

/// Waits for a termination signal.
///
/// Returns `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    };
    tracing::info!(signal = name, "Received signal");
    Ok(())
}

/// Waits for a termination signal.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!(signal = "ctrl-c", "Received signal");
    Ok(())
}

/// Race `signal` against cancellation of `ctx`.
///
/// A delivered signal cancels `ctx`; an already-cancelled `ctx` is not an error.
pub async fn watch_signals<F>(ctx: CancellationToken, signal: F) -> TaskResult
where
    F: Future<Output = io::Result<()>>,
{
    tokio::select! {
        received = signal => {
            received.map_err(TaskError::Signal)?;
            ctx.cancel();
            Ok(Completion::SignalReceived)
        }
        _ = ctx.cancelled() => {
            tracing::debug!("closing signal watcher");
            Ok(Completion::ContextDone)
        }
    }
}

/// The signal watcher as a supervised task.
pub fn signal_task() -> impl Task {
    TaskFn::new(SIGNAL_TASK, |ctx: CancellationToken| {
        watch_signals(ctx, wait_for_shutdown_signal())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn signal_cancels_shared_token() {
        let ctx = CancellationToken::new();
        let (deliver, delivered) = oneshot::channel::<()>();

        let watcher = tokio::spawn(watch_signals(ctx.clone(), async move {
            let _ = delivered.await;
            Ok(())
        }));
        assert!(!ctx.is_cancelled());

        deliver.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), ctx.cancelled())
            .await
            .expect("token should be cancelled after the signal");
        assert_eq!(watcher.await.unwrap().unwrap(), Completion::SignalReceived);
    }

    #[tokio::test]
    async fn returns_when_someone_else_cancels() {
        let ctx = CancellationToken::new();
        ctx.cancel();

        let outcome = watch_signals(ctx, std::future::pending()).await.unwrap();
        assert_eq!(outcome, Completion::ContextDone);
    }

    #[tokio::test]
    async fn registration_failure_is_task_error() {
        let ctx = CancellationToken::new();
        let err = watch_signals(ctx.clone(), async {
            Err(io::Error::other("no signal driver"))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, TaskError::Signal(_)));
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn signal_task_stands_down_on_cancellation() {
        let ctx = CancellationToken::new();
        let task: Box<dyn Task> = Box::new(signal_task());
        assert_eq!(task.name(), SIGNAL_TASK);

        let running = tokio::spawn(task.spawn(ctx.clone()));
        ctx.cancel();
        let outcome = tokio::time::timeout(Duration::from_secs(1), running)
            .await
            .expect("watcher should return")
            .unwrap()
            .unwrap();
        assert_eq!(outcome, Completion::ContextDone);
    }
}
