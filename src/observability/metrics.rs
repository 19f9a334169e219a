//! Metrics collection and exposition.
//!
//! # Metrics
//! - `disperse_batches_total` (counter): batches by outcome status
//! - `disperse_transfers_total` (counter): recipients by outcome status
//! - `disperse_batch_duration_seconds` (histogram): authorize-and-broadcast latency
//! - `disperse_runs_total` (counter): runs by final status

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished batch.
pub fn record_batch(status: &'static str, recipients: usize, started: Instant) {
    counter!("disperse_batches_total", "status" => status).increment(1);
    counter!("disperse_transfers_total", "status" => status).increment(recipients as u64);
    histogram!("disperse_batch_duration_seconds", "status" => status).record(started.elapsed().as_secs_f64());
}

/// Record batches that were never submitted.
pub fn record_skipped(recipients: usize) {
    counter!("disperse_transfers_total", "status" => "skipped").increment(recipients as u64);
}

/// Record the final status of a run.
pub fn record_run(status: &str) {
    counter!("disperse_runs_total", "status" => status.to_string()).increment(1);
}
