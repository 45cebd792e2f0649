//! Startup orchestration.
//!
//! Registers the three server tasks with one supervisor:
//! - `signals`: turns SIGINT/SIGTERM into cancellation
//! - `http-listener`: binds and accepts until told to stop
//! - `http-drain`: on cancellation stops the listener and drains it
//!
//! Binding happens inside the listener task, so a bind failure is reported
//! through the supervisor like any other listener fault.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::{drain_task, ServerControl};
use crate::lifecycle::signals::signal_task;
use crate::lifecycle::supervisor::{Supervisor, SupervisorError};
use crate::users::UserStore;

/// Assemble the supervised server without starting it.
///
/// The returned [`ServerControl`] exposes the listener state and in-flight
/// count while the supervisor runs.
pub fn build<S: UserStore>(
    config: &ServerConfig,
    store: Arc<S>,
    token: CancellationToken,
) -> (Supervisor, ServerControl) {
    let control = ServerControl::new();
    let server = HttpServer::new(config.clone(), store);

    let supervisor = Supervisor::new(token)
        .with_task(signal_task())
        .with_task(server.into_task(control.clone()))
        .with_task(drain_task(control.clone(), config.shutdown.grace()));

    (supervisor, control)
}

/// Run the server until a signal, a listener fault or `token` stops it.
pub async fn run<S: UserStore>(
    config: &ServerConfig,
    store: Arc<S>,
    token: CancellationToken,
) -> Result<(), SupervisorError> {
    let (supervisor, control) = build(config, store, token);
    let result = supervisor.run().await;

    tracing::info!(state = ?control.state(), "server lifecycle finished");
    result
}
