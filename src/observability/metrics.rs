//! Metrics collection and exposition.
//!
//! # Metrics
//! - `server_connections_total` (counter): accepted connections
//! - `server_active_connections` (gauge): in-flight connections
//! - `supervisor_task_completions_total` (counter): task exits by task, outcome
//! - `server_shutdown_total` (counter): drain results (drained, force_closed)
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_connection_opened() {
    counter!("server_connections_total").increment(1);
    gauge!("server_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    gauge!("server_active_connections").decrement(1.0);
}

pub fn record_task_completion(task: &str, outcome: &'static str) {
    counter!(
        "supervisor_task_completions_total",
        "task" => task.to_owned(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_shutdown(outcome: &'static str) {
    counter!("server_shutdown_total", "outcome" => outcome).increment(1);
}
