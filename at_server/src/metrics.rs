//! Prometheus metrics for tournament operations.
//!
//! Counters are recorded by the API handlers and exported in Prometheus text
//! format when a scrape address is configured.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use at_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::tournaments_generated_total("knockout");
//! metrics::sessions_materialized_total(7);
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

/// Increment the generated tournaments counter for a format.
pub fn tournaments_generated_total(format: &str) {
    metrics::counter!("tournaments_generated_total",
        "format" => format.to_string()
    )
    .increment(1);
}

/// Add newly stored sessions.
pub fn sessions_materialized_total(count: usize) {
    metrics::counter!("sessions_materialized_total").increment(count as u64);
}

/// Increment the rankings recomputation counter.
pub fn rankings_recomputed_total() {
    metrics::counter!("rankings_recomputed_total").increment(1);
}

/// Add ledger entries returned by a payout.
pub fn rewards_distributed_total(entries: usize) {
    metrics::counter!("rewards_distributed_total").increment(entries as u64);
}
