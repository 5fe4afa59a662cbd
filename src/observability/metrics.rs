//! Metrics collection and exposition.
//!
//! # Metrics
//! - `callback_proxy_requests_total` (counter): requests by outcome
//!   (final, deferred, completion, error)
//! - `callback_proxy_request_duration_seconds` (histogram): end-to-end latency,
//!   including time spent waiting for a completion
//! - `callback_proxy_registry_deliveries_total` (counter): deliveries by outcome
//!   (delivered, dropped)
//! - `callback_proxy_registry_pending` (gauge): reply ids with waiters
//! - `callback_proxy_timeouts_total` (counter): expiry timers fired

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a finished request by outcome.
pub fn record_outcome(outcome: &'static str) {
    metrics::counter!("callback_proxy_requests_total", "outcome" => outcome).increment(1);
}

/// Count a finished request and record its latency.
pub fn record_request(outcome: &'static str, start: Instant) {
    record_outcome(outcome);
    metrics::histogram!("callback_proxy_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Count a registry delivery.
pub fn record_delivery(found: bool) {
    let outcome = if found { "delivered" } else { "dropped" };
    metrics::counter!("callback_proxy_registry_deliveries_total", "outcome" => outcome)
        .increment(1);
}

/// Publish the number of pending reply ids.
pub fn set_pending(count: usize) {
    metrics::gauge!("callback_proxy_registry_pending").set(count as f64);
}

/// Count a request answered by its expiry timer.
pub fn record_timeout() {
    metrics::counter!("callback_proxy_timeouts_total").increment(1);
}
