//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): dispatched requests by method, status, matched
//! - `gateway_request_duration_seconds` (histogram): dispatch latency
//! - `gateway_route_updates_total` (counter): registrations by result
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing.

use std::time::Instant;

use axum::http::{Method, StatusCode};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder; the handle renders the scrape text.
pub fn install_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed");
            None
        }
    }
}

pub fn record_request(method: &Method, status: StatusCode, matched: bool, start_time: Instant) {
    let matched = if matched { "true" } else { "false" };

    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.as_u16().to_string(),
        "matched" => matched
    )
    .increment(1);

    metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "matched" => matched
    )
    .record(start_time.elapsed().as_secs_f64());
}

/// `result` is one of `ok`, `invalid`, `persist_failed`.
pub fn record_route_update(result: &'static str) {
    metrics::counter!("gateway_route_updates_total", "result" => result).increment(1);
}
