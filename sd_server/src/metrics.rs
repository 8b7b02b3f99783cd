//! Prometheus metrics for monitoring tournament server health.
//!
//! Metrics are exposed in Prometheus text format on `METRICS_BIND` when set.
//! Without an installed recorder every call here is a no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use sd_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/v1/admin/drafts/{draft_id}/pair", 200);
//! metrics::rounds_paired_total();
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Tournament Metrics
// ============================================================================

/// Increment rounds paired counter.
pub fn rounds_paired_total() {
    metrics::counter!("rounds_paired_total").increment(1);
}

/// Increment pairing conflicts counter.
pub fn pairing_conflicts_total() {
    metrics::counter!("pairing_conflicts_total").increment(1);
}

/// Count a match result event (`report`, `confirm` or `override`).
pub fn results_reported_total(kind: &'static str) {
    metrics::counter!("results_reported_total", "kind" => kind).increment(1);
}

/// Set current number of running draft actors.
pub fn active_drafts(count: usize) {
    metrics::gauge!("active_drafts").set(count as f64);
}
