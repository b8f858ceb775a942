//! Prometheus metrics for the gateway
//!
//! Labels carry outcomes and stage names only, never content ids or keys.

use metrics::{counter, gauge, histogram};
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{GatewayError, Result};

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_ERROR: &str = "error";

pub fn record_protect(outcome: &str, stage: &str, duration: Duration) {
    counter!("keygate_protect_total", "outcome" => outcome.to_string(), "stage" => stage.to_string()).increment(1);
    histogram!("keygate_protect_duration_seconds", "outcome" => outcome.to_string())
        .record(duration.as_secs_f64());
}

pub fn set_handshake_nodes(reachable: usize, unreachable: usize) {
    gauge!("keygate_handshake_nodes", "reachable" => "true").set(reachable as f64);
    gauge!("keygate_handshake_nodes", "reachable" => "false").set(unreachable as f64);
}

pub fn set_registry_contracts(count: usize) {
    gauge!("keygate_registry_contracts").set(count as f64);
}

/// Install the global recorder and serve `/metrics` on `addr`
pub fn init_prometheus_exporter(addr: SocketAddr) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| GatewayError::Config(format!("failed to install Prometheus exporter: {e}")))
}
