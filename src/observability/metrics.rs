//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method, status, route
//! - `router_request_duration_seconds` (histogram): dispatch latency
//! - `router_rebuilds_total` (counter): rebuilds by outcome
//! - `router_generation` (gauge): id of the published generation
//! - `router_live_generations` (gauge): generations not yet reclaimed
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op, so tests need no setup
//! - Route label is the pattern, never the raw path (bounded cardinality)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one dispatched request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("route", route.to_string()),
    ];
    metrics::counter!("router_requests_total", &labels).increment(1);
    metrics::histogram!("router_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record a rebuild attempt; `generation` is set on success.
pub fn record_rebuild(generation: Option<u64>) {
    let outcome = if generation.is_some() { "success" } else { "failure" };
    metrics::counter!("router_rebuilds_total", "outcome" => outcome).increment(1);
    if let Some(id) = generation {
        metrics::gauge!("router_generation").set(id as f64);
    }
}

pub(crate) fn generation_created() {
    metrics::gauge!("router_live_generations").increment(1.0);
}

pub(crate) fn generation_reclaimed() {
    metrics::gauge!("router_live_generations").decrement(1.0);
}
