//! Shutdown outcome reporting.
//!
//! Teardown never stops at the first failure; each failed step is recorded
//! here and the caller decides what the process exit code should be.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use thiserror::Error;

use crate::dependency::BoxError;
use crate::net::listener::ListenerKind;

/// The fixed teardown sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShutdownStep {
    SubServices,
    RpcListeners,
    HttpListeners,
    Database,
    Cache,
}

impl ShutdownStep {
    pub const ORDER: [ShutdownStep; 5] = [
        ShutdownStep::SubServices,
        ShutdownStep::RpcListeners,
        ShutdownStep::HttpListeners,
        ShutdownStep::Database,
        ShutdownStep::Cache,
    ];
}

/// A resource that failed to release cleanly.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("sub-service {name} failed to close: {source}")]
    SubService {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("{kind} listener on {address} did not drain within {timeout:?}")]
    Timeout {
        kind: ListenerKind,
        address: SocketAddr,
        timeout: Duration,
    },

    #[error("{kind} listener task on {address} failed: {reason}")]
    Panicked {
        kind: ListenerKind,
        address: SocketAddr,
        reason: String,
    },

    #[error("failed to close database: {0}")]
    Database(#[source] BoxError),

    #[error("failed to close cache: {0}")]
    Cache(#[source] BoxError),
}

impl ShutdownError {
    /// The teardown step that produced this error.
    pub fn step(&self) -> ShutdownStep {
        match self {
            ShutdownError::SubService { .. } => ShutdownStep::SubServices,
            ShutdownError::Timeout { kind, .. } | ShutdownError::Panicked { kind, .. } => match kind {
                ListenerKind::Rpc => ShutdownStep::RpcListeners,
                ListenerKind::Http => ShutdownStep::HttpListeners,
            },
            ShutdownError::Database(_) => ShutdownStep::Database,
            ShutdownError::Cache(_) => ShutdownStep::Cache,
        }
    }
}

/// Aggregated result of [`Service::stop`](crate::Service::stop).
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Steps that ran, in order.
    pub steps: Vec<ShutdownStep>,
    /// Every resource that failed to release.
    pub errors: Vec<ShutdownError>,
}

impl ShutdownReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn step(&mut self, step: ShutdownStep) {
        self.steps.push(step);
    }

    pub(crate) fn record(&mut self, error: ShutdownError) {
        self.errors.push(error);
    }

    /// True when every resource released without error.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Exit code for a process that terminates after this shutdown.
    pub fn exit_code(&self) -> ExitCode {
        if self.is_clean() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_clean() {
        let report = ShutdownReport::new();
        assert!(report.is_clean());
        assert!(report.steps.is_empty());
    }

    #[test]
    fn test_errors_map_to_steps() {
        let mut report = ShutdownReport::new();
        report.record(ShutdownError::SubService {
            name: "indexer".into(),
            source: "boom".into(),
        });
        report.record(ShutdownError::Timeout {
            kind: ListenerKind::Rpc,
            address: "127.0.0.1:1".parse().unwrap(),
            timeout: Duration::from_secs(1),
        });
        report.record(ShutdownError::Cache("gone".into()));

        let steps: Vec<_> = report.errors.iter().map(ShutdownError::step).collect();
        assert_eq!(
            steps,
            vec![
                ShutdownStep::SubServices,
                ShutdownStep::RpcListeners,
                ShutdownStep::Cache
            ]
        );
        assert!(!report.is_clean());
        assert_eq!(
            report.errors[0].to_string(),
            "sub-service indexer failed to close: boom"
        );
    }
}
