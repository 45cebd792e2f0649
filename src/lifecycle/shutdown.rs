//! Shutdown coordination for the HTTP listener.
//!
//! ```text
//! Starting ─bind─► Running ─token cancelled─► StopRequested ─► Draining ─┬─► Drained
//!                                                                        └─► ForceClosed
//! ```
//!
//! If the token is cancelled before the listener binds, the state goes from
//! `Starting` straight to `StopRequested` and `Running` is never entered.
//!
//! The drain task owns every transition after `Running`. The listener task
//! only watches `stop_accepting`, and connection tasks watch both tokens.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::task::{Completion, Task, TaskFn, TaskResult};
use crate::net::ConnectionTracker;
use crate::observability::metrics;

/// Task name used in logs and errors.
pub const DRAIN_TASK: &str = "http-drain";

/// Listener subsystem state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Starting,
    Running,
    StopRequested,
    Draining,
    Drained,
    ForceClosed,
}

impl ListenerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ListenerState::Drained | ListenerState::ForceClosed)
    }
}

/// Handles shared between the listener, its connections and the drain task.
#[derive(Debug, Clone)]
pub struct ServerControl {
    stop_accepting: CancellationToken,
    force_close: CancellationToken,
    tracker: ConnectionTracker,
    state: Arc<watch::Sender<ListenerState>>,
}

impl ServerControl {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ListenerState::Starting);
        Self {
            stop_accepting: CancellationToken::new(),
            force_close: CancellationToken::new(),
            tracker: ConnectionTracker::new(),
            state: Arc::new(state),
        }
    }

    /// Cancelled when the listener must stop accepting; open connections
    /// should finish their current request and close.
    pub fn stop_accepting(&self) -> &CancellationToken {
        &self.stop_accepting
    }

    /// Cancelled when the grace period ran out; open connections must drop.
    pub fn force_close(&self) -> &CancellationToken {
        &self.force_close
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    pub(crate) fn set_state(&self, next: ListenerState) {
        let previous = self.state.send_replace(next);
        tracing::debug!(from = ?previous, to = ?next, "listener state changed");
    }

    /// Move `Starting` to `Running`.
    ///
    /// Returns false when shutdown already moved the state on; the listener
    /// must not start accepting then.
    pub(crate) fn mark_running(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == ListenerState::Starting {
                *state = ListenerState::Running;
                true
            } else {
                false
            }
        })
    }
}

impl Default for ServerControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for `ctx` to be cancelled, then stop the listener and drain it.
///
/// In-flight connections get `grace` to finish. Whatever is still open after
/// that is dropped and the result is [`Completion::ForceClosed`].
pub async fn drain(ctx: CancellationToken, control: ServerControl, grace: Duration) -> TaskResult {
    ctx.cancelled().await;

    control.set_state(ListenerState::StopRequested);
    control.stop_accepting.cancel();
    control.set_state(ListenerState::Draining);

    tracing::info!(
        in_flight = control.tracker.active_count(),
        grace = ?grace,
        "shutting down http server, please wait..."
    );

    match tokio::time::timeout(grace, control.tracker.wait_idle()).await {
        Ok(()) => {
            control.set_state(ListenerState::Drained);
            metrics::record_shutdown(Completion::Drained.as_label());
            tracing::info!("http server drained");
            Ok(Completion::Drained)
        }
        Err(_elapsed) => {
            let remaining = control.tracker.active_count();
            control.force_close.cancel();
            control.set_state(ListenerState::ForceClosed);
            metrics::record_shutdown(Completion::ForceClosed.as_label());
            tracing::warn!(
                remaining,
                grace = ?grace,
                "grace period elapsed, forcing connections closed"
            );
            Ok(Completion::ForceClosed)
        }
    }
}

/// The drain routine as a supervised task.
pub fn drain_task(control: ServerControl, grace: Duration) -> impl Task {
    TaskFn::new(DRAIN_TASK, move |ctx: CancellationToken| drain(ctx, control, grace))
}
