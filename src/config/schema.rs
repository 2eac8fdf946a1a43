//! Configuration schema definitions.
//!
//! This module defines the file-backed configuration of a service.
//! All types derive Serde traits for deserialization from TOML.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::health::ProbeSettings;
use crate::service::options::{
    with_probe_settings, with_readiness_interval, with_rpc_server, with_shutdown_timeout,
    with_status_server, ServiceOption,
};

/// Root configuration for a service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name, used in logs, metrics and debug output.
    pub name: String,

    /// Listener addresses.
    pub listeners: ListenersConfig,

    /// Probe timeouts and retry bounds.
    pub probes: ProbeConfig,

    /// Readiness evaluation schedule.
    pub readiness: ReadinessConfig,

    /// Shutdown deadlines.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "service".to_string(),
            listeners: ListenersConfig::default(),
            probes: ProbeConfig::default(),
            readiness: ReadinessConfig::default(),
            shutdown: ShutdownConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// The options this configuration stands for, in application order.
    ///
    /// Tuning options come first so listeners see the final settings.
    pub fn options(&self) -> Vec<ServiceOption> {
        let mut options = vec![
            with_probe_settings(self.probes.settings()),
            with_shutdown_timeout(self.shutdown.grace_period()),
        ];

        if let Some(interval) = self.readiness.interval() {
            options.push(with_readiness_interval(interval));
        }

        for address in &self.listeners.rpc {
            options.push(with_rpc_server(address.clone()));
        }

        if let Some(address) = &self.listeners.status {
            options.push(with_status_server(address.clone()));
        }

        options
    }
}

/// Listener addresses (`ip:port` or `:port`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenersConfig {
    /// Internal status listener (health, readiness, metrics, debug).
    pub status: Option<String>,

    /// gRPC listeners.
    pub rpc: Vec<String>,
}

/// Probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Timeout of a single connection attempt in milliseconds.
    pub connect_timeout_ms: u64,

    /// Connection attempts per HTTP listener.
    pub http_attempts: u32,

    /// Base delay between HTTP attempts in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Maximum delay between HTTP attempts in milliseconds.
    pub retry_max_delay_ms: u64,

    /// Timeout of a database or cache ping in milliseconds.
    pub dependency_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 1000,
            http_attempts: 5,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 1000,
            dependency_timeout_ms: 2000,
        }
    }
}

impl ProbeConfig {
    pub fn settings(&self) -> ProbeSettings {
        ProbeSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            http_attempts: self.http_attempts,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
            retry_max_delay: Duration::from_millis(self.retry_max_delay_ms),
            dependency_timeout: Duration::from_millis(self.dependency_timeout_ms),
        }
    }
}

/// Readiness configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Re-evaluation interval in seconds. Unset means evaluate once.
    pub interval_secs: Option<u64>,
}

impl ReadinessConfig {
    pub fn interval(&self) -> Option<Duration> {
        self.interval_secs.map(Duration::from_secs)
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long each listener may take to drain, in seconds.
    pub grace_period_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 10,
        }
    }
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.name, "service");
        assert!(config.listeners.status.is_none());
        assert!(config.readiness.interval().is_none());
        assert_eq!(config.shutdown.grace_period(), Duration::from_secs(10));
        assert_eq!(config.probes.settings(), ProbeSettings::default());
    }

    #[test]
    fn test_options_cover_listeners_and_tuning() {
        let mut config = ServiceConfig::default();
        config.listeners.status = Some(":5051".into());
        config.listeners.rpc = vec![":8080".into(), ":8081".into()];
        config.readiness.interval_secs = Some(15);

        // probes, shutdown, readiness, two rpc, status
        assert_eq!(config.options().len(), 6);
    }
}
