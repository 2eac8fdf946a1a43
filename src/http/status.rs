//! Internal status listener routes.
//!
//! # Routes
//! - `GET /health/live`   → AND over the liveness checkers, evaluated per request
//! - `GET /ready`         → readiness flag
//! - `GET /health/ready`  → same as `/ready`
//! - `GET /metrics`       → Prometheus text exposition
//! - `GET /debug/pprof/*` → debug introspection
//!
//! # Design Decisions
//! - Handlers only read service state; they never own it
//! - Success is an empty 200; failure is the generic JSON error payload

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::health::{all_alive, checker, Checker, Probes, ReadinessFlag};
use crate::http::debug;
use crate::http::response::answer_with_json_error;
use crate::observability::metrics;

const STATUS_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Service state handed to HTTP listeners when the service starts.
#[derive(Clone)]
pub struct StatusContext {
    pub service_name: Arc<str>,
    pub probes: Arc<Probes>,
    pub readiness: ReadinessFlag,
    /// Extra liveness checkers supplied through options.
    pub checkers: Arc<[Checker]>,
    pub started_at: Instant,
}

#[derive(Clone)]
pub(crate) struct StatusState {
    pub(crate) context: StatusContext,
    checkers: Arc<[Checker]>,
    metrics: PrometheusHandle,
}

/// Build the status router.
///
/// Liveness is the service's own probe ANDed with the extra checkers.
#[allow(deprecated)]
pub fn status_router(context: &StatusContext, metrics: PrometheusHandle) -> Router {
    let probes = context.probes.clone();
    let service_alive = checker(move || {
        let probes = probes.clone();
        async move { probes.is_alive().await }
    });

    let checkers: Arc<[Checker]> = std::iter::once(service_alive)
        .chain(context.checkers.iter().cloned())
        .collect();

    let state = StatusState {
        context: context.clone(),
        checkers,
        metrics,
    };

    Router::new()
        .route("/health/live", get(live))
        .route("/ready", get(ready))
        .route("/health/ready", get(ready))
        .route("/metrics", get(render_metrics))
        .route("/debug/pprof", get(debug::index))
        .route("/debug/pprof/", get(debug::index))
        .route("/debug/pprof/cmdline", get(debug::cmdline))
        .route("/debug/pprof/vars", get(debug::vars))
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(STATUS_REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
}

async fn live(State(state): State<StatusState>) -> Response {
    let alive = all_alive(&state.checkers).await;
    metrics::record_liveness(alive);

    if alive {
        StatusCode::OK.into_response()
    } else {
        tracing::debug!("Liveness check failed");
        answer_with_json_error(StatusCode::SERVICE_UNAVAILABLE)
    }
}

async fn ready(State(state): State<StatusState>) -> Response {
    if state.context.readiness.is_ready() {
        StatusCode::OK.into_response()
    } else {
        answer_with_json_error(StatusCode::SERVICE_UNAVAILABLE)
    }
}

async fn render_metrics(State(state): State<StatusState>) -> Response {
    metrics::collect_process_metrics();
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.render(),
    )
        .into_response()
}
