//! Debug introspection routes under `/debug/pprof`.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::health::readiness::Readiness;
use crate::http::status::StatusState;

const INDEX: &str = "cmdline\nvars\n";

#[derive(Debug, Serialize)]
pub struct DebugVars {
    pub service: String,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub readiness: Readiness,
    pub listeners: Vec<ListenerVar>,
}

#[derive(Debug, Serialize)]
pub struct ListenerVar {
    pub kind: &'static str,
    pub address: String,
}

pub(crate) async fn index() -> &'static str {
    INDEX
}

/// Command line of the process, NUL-separated.
pub(crate) async fn cmdline() -> String {
    std::env::args().collect::<Vec<_>>().join("\0")
}

pub(crate) async fn vars(State(state): State<StatusState>) -> Json<DebugVars> {
    let context = &state.context;
    let listeners = context
        .probes
        .listeners()
        .map(|(kind, address)| ListenerVar {
            kind: kind.as_str(),
            address: address.to_string(),
        })
        .collect();

    Json(DebugVars {
        service: context.service_name.to_string(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: context.started_at.elapsed().as_secs(),
        readiness: context.readiness.state(),
        listeners,
    })
}
