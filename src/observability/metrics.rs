//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, kind
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_documents_rewritten_total` (counter): HTML documents rewritten
//! - `proxy_blocked_targets_total` (counter): targets refused, by reason
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request. `kind` is `html`, `passthrough`, `preflight`
/// or an error kind.
pub fn record_request(method: &str, status: u16, kind: &'static str, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "kind" => kind
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rewrite() {
    counter!("proxy_documents_rewritten_total").increment(1);
}

pub fn record_blocked(reason: &'static str) {
    counter!("proxy_blocked_targets_total", "reason" => reason).increment(1);
}
