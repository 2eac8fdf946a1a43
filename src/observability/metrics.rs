//! Metrics collection and exposition.
//!
//! # Metrics
//! - `service_info` (gauge): 1, labelled with service name and version
//! - `service_ready` (gauge): 1=ready, 0=not ready
//! - `service_liveness_checks_total` (counter): liveness probes by result
//! - `service_listener_failures_total` (counter): listener failures by kind
//! - `service_shutdown_errors_total` (counter): resources that failed to release
//! - `process_*`: CPU seconds, resident/virtual memory, open fds, threads and
//!   start time, sampled from the OS on every scrape
//!
//! # Design Decisions
//! - One Prometheus recorder per process, installed on first use
//! - Recording without an installed recorder is a no-op

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use metrics_process::Collector;
use thiserror::Error;

use crate::net::listener::ListenerKind;

static RECORDER: OnceLock<Result<PrometheusHandle, String>> = OnceLock::new();
static PROCESS: OnceLock<Collector> = OnceLock::new();

#[derive(Debug, Clone, Error)]
#[error("failed to install Prometheus recorder: {0}")]
pub struct MetricsError(String);

/// Handle of the process-wide Prometheus recorder, installing it if needed.
pub fn prometheus_handle() -> Result<PrometheusHandle, MetricsError> {
    RECORDER
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| e.to_string())?;
            describe();
            Ok(handle)
        })
        .clone()
        .map_err(MetricsError)
}

fn describe() {
    describe_gauge!("service_info", "Static service information");
    describe_gauge!("service_ready", "Outcome of the last readiness evaluation");
    describe_counter!("service_liveness_checks_total", "Liveness probes served");
    describe_counter!("service_listener_failures_total", "Listener bind or serve failures");
    describe_counter!("service_shutdown_errors_total", "Resources that failed to release");

    process_collector().describe();
}

fn process_collector() -> &'static Collector {
    PROCESS.get_or_init(Collector::default)
}

/// Refresh the `process_*` gauges; call right before rendering.
pub fn collect_process_metrics() {
    if RECORDER.get().is_some_and(|recorder| recorder.is_ok()) {
        process_collector().collect();
    }
}

pub fn record_service_info(service: &str) {
    gauge!(
        "service_info",
        "service" => service.to_string(),
        "version" => env!("CARGO_PKG_VERSION")
    )
    .set(1.0);
}

pub fn record_readiness(ready: bool) {
    gauge!("service_ready").set(if ready { 1.0 } else { 0.0 });
}

pub fn record_liveness(alive: bool) {
    let result = if alive { "alive" } else { "dead" };
    counter!("service_liveness_checks_total", "result" => result).increment(1);
}

pub fn record_listener_failure(kind: ListenerKind) {
    counter!("service_listener_failures_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_shutdown_errors(count: usize) {
    counter!("service_shutdown_errors_total").increment(count as u64);
}
