//! Local metrics collection and Prometheus exposition.
//!
//! # Metrics
//! - `requests_total` (counter): requests by path, method, status
//! - `request_latency_ms` (histogram): latency by path, method
//! - `memo_cache_hits_total` / `memo_cache_misses_total` (counters)
//! - `memo_cache_entries` (gauge): memo table size
//!
//! These mirror the OTLP instruments held by [`Telemetry`] so the service
//! can also be scraped directly. Until [`init_metrics`] installs a recorder
//! every call here is a no-op.
//!
//! [`Telemetry`]: crate::observability::Telemetry

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics exporter started");
    Ok(())
}

/// Record one completed request.
pub fn record_request(path: &str, method: &str, status: u16, latency_ms: u64) {
    ::metrics::counter!(
        "requests_total",
        "path" => path.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    ::metrics::histogram!(
        "request_latency_ms",
        "path" => path.to_string(),
        "method" => method.to_string()
    )
    .record(latency_ms as f64);
}

/// Record a memo table lookup.
pub fn record_cache_lookup(hit: bool) {
    if hit {
        ::metrics::counter!("memo_cache_hits_total").increment(1);
    } else {
        ::metrics::counter!("memo_cache_misses_total").increment(1);
    }
}

/// Record the current memo table size.
pub fn record_cache_size(entries: usize) {
    ::metrics::gauge!("memo_cache_entries").set(entries as f64);
}
