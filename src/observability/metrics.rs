//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): completed requests by path, status
//! - `http_request_duration_seconds` (histogram): latency by path
//! - `http_panics_recovered_total` (counter)
//! - `http_auth_rejections_total` (counter)
//! - `http_connections_active` (gauge)
//! - `http_accept_errors_total` (counter): transient accept failures
//!
//! Recording goes through the `metrics` facade and is a no-op until an
//! exporter is installed.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(path: &str, status: u16, latency: Duration) {
    metrics::counter!(
        "http_requests_total",
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "path" => path.to_string())
        .record(latency.as_secs_f64());
}

pub fn record_panic_recovered() {
    metrics::counter!("http_panics_recovered_total").increment(1);
}

pub fn record_auth_rejected() {
    metrics::counter!("http_auth_rejections_total").increment(1);
}

pub fn record_accept_error() {
    metrics::counter!("http_accept_errors_total").increment(1);
}

pub fn set_active_connections(count: u64) {
    metrics::gauge!("http_connections_active").set(count as f64);
}
