//! Metrics collection and exposition.
//!
//! # Metrics
//! - `kiosk_config_reloads_total` (counter): reload attempts by outcome
//! - `kiosk_config_hash_checks_total` (counter): content hash comparisons
//! - `kiosk_config_generation` (gauge): generation of the live snapshot
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Recording is a no-op until `init_metrics` installs the exporter

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a reload attempt. `outcome` is `success` or `failure`.
pub fn record_reload(outcome: &'static str) {
    metrics::counter!("kiosk_config_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_hash_check() {
    metrics::counter!("kiosk_config_hash_checks_total").increment(1);
}

pub fn set_generation(generation: u64) {
    metrics::gauge!("kiosk_config_generation").set(generation as f64);
}
