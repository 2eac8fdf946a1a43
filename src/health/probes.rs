//! Liveness and readiness evaluation.
//!
//! # Responsibilities
//! - Liveness: every listener reachable, database pings, cache answers PONG
//! - Readiness: liveness conditions plus every sub-service ready
//!
//! # Design Decisions
//! - A dependency that is not configured counts as satisfied
//! - Probe failures become `false` and a log line, never an error
//! - Dependency pings are bounded by `dependency_timeout`

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time;

use crate::dependency::{Cache, Database, SubService, CACHE_PONG};
use crate::health::reachability::{http_reachable, rpc_reachable};
use crate::net::listener::{ListenerAddress, ListenerKind};

/// Upper bound on waiting for listeners to finish their bind attempt.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeouts and retry bounds used by every probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Deadline for a single connection attempt.
    pub connect_timeout: Duration,
    /// Connection attempts per HTTP listener before giving up.
    pub http_attempts: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    /// Deadline for a database or cache ping.
    pub dependency_timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(1),
            http_attempts: 5,
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(1),
            dependency_timeout: Duration::from_secs(2),
        }
    }
}

/// Read-only view of everything the service probes.
///
/// Built when the service starts; shared by the status routes and the
/// readiness monitor.
#[derive(Clone)]
pub struct Probes {
    pub(crate) rpc: Vec<ListenerAddress>,
    pub(crate) http: Vec<ListenerAddress>,
    pub(crate) database: Option<Arc<dyn Database>>,
    pub(crate) cache: Option<Arc<dyn Cache>>,
    pub(crate) sub_services: Vec<Arc<dyn SubService>>,
    pub(crate) settings: ProbeSettings,
}

impl Probes {
    /// Liveness: listeners reachable and dependencies answering.
    pub async fn is_alive(&self) -> bool {
        let rpc = self.rpc_listeners_up().await;
        if !rpc {
            tracing::debug!("gRPC servers not alive");
        }
        let http = self.http_listeners_up().await;
        let database = self.database_up().await;
        let cache = self.cache_up().await;

        rpc && http && database && cache
    }

    /// Readiness: sub-services ready plus every liveness condition.
    pub async fn evaluate_readiness(&self) -> bool {
        let sub_services = self.sub_services_ready().await;
        let rpc = self.rpc_listeners_up().await;
        if !rpc {
            tracing::error!("gRPC servers not ready");
        }
        let http = self.http_listeners_up().await;
        let database = self.database_up().await;
        let cache = self.cache_up().await;

        sub_services && rpc && http && database && cache
    }

    /// Wait until every listener has either bound or failed to bind.
    pub async fn wait_for_listeners(&self) {
        let settled = join_all(self.rpc.iter().chain(self.http.iter()).map(|address| address.settled()));
        if time::timeout(SETTLE_TIMEOUT, settled).await.is_err() {
            tracing::warn!("Listeners still binding, evaluating readiness anyway");
        }
    }

    /// Every listener with its kind, RPC first.
    pub fn listeners(&self) -> impl Iterator<Item = (ListenerKind, &ListenerAddress)> {
        self.rpc
            .iter()
            .map(|address| (ListenerKind::Rpc, address))
            .chain(self.http.iter().map(|address| (ListenerKind::Http, address)))
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    async fn rpc_listeners_up(&self) -> bool {
        for address in &self.rpc {
            if !rpc_reachable(address.probe_target(), &self.settings).await {
                return false;
            }
        }
        true
    }

    async fn http_listeners_up(&self) -> bool {
        let mut all_up = true;
        for address in &self.http {
            if !http_reachable(address.probe_target(), &self.settings).await {
                all_up = false;
            }
        }
        all_up
    }

    async fn database_up(&self) -> bool {
        let Some(database) = &self.database else {
            return true;
        };

        match time::timeout(self.settings.dependency_timeout, database.ping()).await {
            Ok(Ok(())) => {
                tracing::debug!("Database is ready");
                true
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Database is not ready");
                false
            }
            Err(_) => {
                tracing::debug!("Database ping timed out");
                false
            }
        }
    }

    async fn cache_up(&self) -> bool {
        let Some(cache) = &self.cache else {
            return true;
        };

        match time::timeout(self.settings.dependency_timeout, cache.ping()).await {
            Ok(Ok(reply)) if reply == CACHE_PONG => {
                tracing::debug!("Cache is ready");
                true
            }
            Ok(Ok(reply)) => {
                tracing::debug!(reply = %reply, "Cache answered with unexpected reply");
                false
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Cache is not ready");
                false
            }
            Err(_) => {
                tracing::debug!("Cache ping timed out");
                false
            }
        }
    }

    async fn sub_services_ready(&self) -> bool {
        let mut all_ready = true;
        for sub_service in &self.sub_services {
            if sub_service.ready().await {
                tracing::info!(sub_service = sub_service.name(), "Sub-service is ready");
            } else {
                tracing::error!(sub_service = sub_service.name(), "Sub-service not ready");
                all_ready = false;
            }
        }
        all_ready
    }
}
