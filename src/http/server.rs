//! HTTP server setup and the listener lifecycle task.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeouts, request ID)
//! - Run the accept loop until told to stop accepting
//! - Serve each connection with hyper, closing it gracefully on stop and
//!   dropping it on force close

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto,
    service::TowerToHyperService,
};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::handlers;
use crate::http::request::MakeRequestUuid;
use crate::lifecycle::shutdown::ServerControl;
use crate::lifecycle::task::{Completion, Task, TaskFn, TaskResult};
use crate::net::{ConnectionGuard, ConnectionPermit, Listener};
use crate::users::UserStore;

/// Task name used in logs and errors.
pub const LISTENER_TASK: &str = "http-listener";

/// Pause after a transient accept error before accepting again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// HTTP server bound to one user store.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new<S: UserStore>(config: ServerConfig, store: Arc<S>) -> Self {
        let router = Self::build_router(&config, store);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router<S: UserStore>(config: &ServerConfig, store: Arc<S>) -> Router {
        Router::new()
            .route("/ping", get(handlers::ping))
            .route(
                "/users/{id}",
                get(handlers::get_user::<S>).put(handlers::update_user::<S>),
            )
            .with_state(store)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::REQUEST_TIMEOUT,
                        config.timeouts.write(),
                    )),
            )
    }

    /// The router, for serving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind and accept connections until `control.stop_accepting()` fires.
    ///
    /// A bind failure or an unexpected accept error cancels `ctx` and is
    /// returned as a listener fault. If shutdown began before the listener
    /// got going, it returns without accepting anything.
    pub async fn run(self, ctx: CancellationToken, control: ServerControl) -> TaskResult {
        if ctx.is_cancelled() || control.stop_accepting().is_cancelled() {
            tracing::info!("shutdown requested before http server started");
            return Ok(Completion::Stopped);
        }

        let listener = match Listener::bind(&self.config.listener).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, "http server failed to start");
                ctx.cancel();
                return Err(e.into());
            }
        };
        if !control.mark_running() {
            tracing::info!("shutdown requested while http server was binding");
            return Ok(Completion::Stopped);
        }
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "HTTP server starting");
        }

        loop {
            let accepted = tokio::select! {
                _ = control.stop_accepting().cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer, permit)) => {
                    let guard = control.tracker().track();
                    self.spawn_connection(stream, peer, permit, guard, &control);
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(error = %e, "transient accept error");
                    tokio::select! {
                        _ = control.stop_accepting().cancelled() => break,
                        _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "http server stopped unexpectedly");
                    ctx.cancel();
                    return Err(e.into());
                }
            }
        }

        tracing::info!("http server stopped");
        Ok(Completion::Stopped)
    }

    /// The accept loop as a supervised task.
    pub fn into_task(self, control: ServerControl) -> impl Task {
        TaskFn::new(LISTENER_TASK, move |ctx: CancellationToken| self.run(ctx, control))
    }

    fn spawn_connection(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        permit: ConnectionPermit,
        guard: ConnectionGuard,
        control: &ServerControl,
    ) {
        let service = TowerToHyperService::new(self.router.clone());
        let read_timeout = self.config.timeouts.read();
        let stop = control.stop_accepting().clone();
        let force = control.force_close().clone();

        tokio::spawn(async move {
            let _permit = permit;
            let connection_id = guard.id();

            let mut builder = auto::Builder::new(TokioExecutor::new());
            builder
                .http1()
                .timer(TokioTimer::new())
                .header_read_timeout(read_timeout);
            let conn = builder.serve_connection(TokioIo::new(stream), service);
            tokio::pin!(conn);

            let result = tokio::select! {
                result = conn.as_mut() => Some(result),
                _ = stop.cancelled() => None,
            };
            let result = match result {
                Some(result) => result,
                None => {
                    // Finish the current request, then close.
                    conn.as_mut().graceful_shutdown();
                    tokio::select! {
                        result = conn.as_mut() => result,
                        _ = force.cancelled() => {
                            tracing::debug!(%connection_id, peer = %peer, "connection force closed");
                            return;
                        }
                    }
                }
            };

            if let Err(e) = result {
                tracing::debug!(%connection_id, peer = %peer, error = %e, "connection error");
            }
            drop(guard);
        });
    }
}
