//! Metrics collection and exposition.
//!
//! # Metrics
//! - `control_plane_operations_total` (counter): admin operations by operation, outcome
//! - `control_plane_operation_duration_seconds` (histogram): end-to-end latency
//! - `control_plane_restarts_total` (counter): restarts by service, outcome
//! - `control_plane_restart_duration_seconds` (histogram): restart latency, retries included
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one admin operation. `outcome` is `ok` or an error kind.
pub fn record_operation(operation: &'static str, outcome: &'static str, start: Instant) {
    counter!(
        "control_plane_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    histogram!("control_plane_operation_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_restart(service: &'static str, success: bool, start: Instant) {
    let outcome = if success { "ok" } else { "failed" };
    counter!(
        "control_plane_restarts_total",
        "service" => service,
        "outcome" => outcome
    )
    .increment(1);
    histogram!("control_plane_restart_duration_seconds", "service" => service)
        .record(start.elapsed().as_secs_f64());
}
