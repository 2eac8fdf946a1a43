//! The service orchestrator.
//!
//! # Data Flow
//! ```text
//! Service::new(name, options)
//!     → options applied in order, first failure aborts
//!
//! start()
//!     → one task per listener (bind + serve)
//!     → readiness monitor task
//!     → wait: termination signal | context cancelled | listener failure
//!
//! stop()
//!     → sub-services → RPC listeners → HTTP listeners → database → cache
//!     → ShutdownReport
//! ```
//!
//! # Design Decisions
//! - Configuration is frozen once `start` is called
//! - Listener and dependency collections are read-only after start; only the
//!   readiness flag changes, and it is atomic
//! - `stop` never fails early and never exits the process

pub mod error;
pub mod options;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::service::RoutesBuilder;
use tonic::transport::Server;

use crate::dependency::{Cache, Database, SubService};
use crate::health::{all_alive, Checker, ProbeSettings, Probes, ReadinessFlag, ReadinessMonitor};
use crate::http::{status_router, StatusContext};
use crate::lifecycle::shutdown::{ShutdownError, ShutdownReport, ShutdownStep};
use crate::lifecycle::signals::{SignalTrap, Trapped};
use crate::lifecycle::startup;
use crate::net::listener::{
    parse_address, AppFactory, HttpHandle, HttpListener, ListenerAddress, ListenerKind,
    RpcHandle, RpcListener, RunningListener,
};
use crate::observability::metrics;

pub use error::{OptionError, ServiceError};
pub use options::ServiceOption;

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// A process exposing HTTP and gRPC listeners, with health reporting and
/// ordered shutdown.
pub struct Service {
    name: String,
    context: CancellationToken,

    http_listeners: Vec<HttpListener>,
    rpc_listeners: Vec<RpcListener>,

    database: Option<Arc<dyn Database>>,
    cache: Option<Arc<dyn Cache>>,
    sub_services: Vec<Arc<dyn SubService>>,
    sub_service_index: HashMap<String, usize>,

    liveness_checkers: Vec<Checker>,
    readiness: ReadinessFlag,
    readiness_interval: Option<Duration>,
    probe_settings: ProbeSettings,
    shutdown_timeout: Duration,

    signal_trap: Option<SignalTrap>,
    background: CancellationToken,
    readiness_task: Option<JoinHandle<()>>,
    started: bool,
    stopped: bool,
}

impl Service {
    /// Create a service and apply `options` in order.
    ///
    /// Installs the SIGINT/SIGTERM handlers, so it must be called from within
    /// a Tokio runtime.
    pub fn new(
        name: impl Into<String>,
        options: impl IntoIterator<Item = ServiceOption>,
    ) -> Result<Self, ServiceError> {
        let signal_trap = SignalTrap::new().map_err(ServiceError::Signal)?;

        let mut service = Self {
            name: name.into(),
            context: CancellationToken::new(),
            http_listeners: Vec::new(),
            rpc_listeners: Vec::new(),
            database: None,
            cache: None,
            sub_services: Vec::new(),
            sub_service_index: HashMap::new(),
            liveness_checkers: Vec::new(),
            readiness: ReadinessFlag::new(),
            readiness_interval: None,
            probe_settings: ProbeSettings::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            signal_trap: Some(signal_trap),
            background: CancellationToken::new(),
            readiness_task: None,
            started: false,
            stopped: false,
        };

        for option in options {
            option.apply(&mut service)?;
        }

        tracing::info!(
            service = %service.name,
            http_listeners = service.http_listeners.len(),
            rpc_listeners = service.rpc_listeners.len(),
            sub_services = service.sub_services.len(),
            "Service configured"
        );

        Ok(service)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The token whose cancellation ends [`start`](Self::start).
    pub fn context(&self) -> CancellationToken {
        self.context.clone()
    }

    pub fn set_context(&mut self, context: CancellationToken) {
        self.context = context;
    }

    /// Shared readiness flag, as served on `/ready`.
    pub fn readiness(&self) -> ReadinessFlag {
        self.readiness.clone()
    }

    fn ensure_configurable(&self) -> Result<(), OptionError> {
        if self.started {
            Err(OptionError::AlreadyStarted)
        } else {
            Ok(())
        }
    }

    /// Add an application HTTP listener serving `router`.
    pub fn add_http_server(&mut self, address: &str, router: Router) -> Result<HttpHandle, OptionError> {
        self.add_http_app(address, Box::new(move |_: &StatusContext| router))
    }

    /// Add the internal status listener and register its collectors.
    pub fn add_status_server(&mut self, address: &str) -> Result<HttpHandle, OptionError> {
        let handle = metrics::prometheus_handle()?;
        metrics::record_service_info(&self.name);

        self.add_http_app(
            address,
            Box::new(move |context: &StatusContext| status_router(context, handle)),
        )
    }

    fn add_http_app(&mut self, address: &str, app: AppFactory) -> Result<HttpHandle, OptionError> {
        self.ensure_configurable()?;
        let address = parse_address(address)?;

        self.http_listeners.push(HttpListener::new(address, app));
        tracing::debug!(address = %address, "HTTP listener registered");
        Ok(HttpHandle(self.http_listeners.len() - 1))
    }

    /// Add a gRPC listener. Attach services to it through [`rpc_routes`](Self::rpc_routes).
    pub fn add_rpc_server(&mut self, address: &str) -> Result<RpcHandle, OptionError> {
        self.ensure_configurable()?;
        let address = parse_address(address)?;

        self.rpc_listeners.push(RpcListener::new(address));
        tracing::debug!(address = %address, "gRPC listener registered");
        Ok(RpcHandle(self.rpc_listeners.len() - 1))
    }

    /// Routes of the gRPC listener behind `handle`, for registering services.
    ///
    /// ```ignore
    /// service.rpc_routes(handle)?.add_service(GreeterServer::new(greeter));
    /// ```
    pub fn rpc_routes(&mut self, handle: RpcHandle) -> Result<&mut RoutesBuilder, OptionError> {
        self.ensure_configurable()?;
        self.rpc_listeners
            .get_mut(handle.0)
            .map(|listener| &mut listener.routes)
            .ok_or(OptionError::UnknownRpcListener(handle))
    }

    pub fn http_handles(&self) -> Vec<HttpHandle> {
        (0..self.http_listeners.len()).map(HttpHandle).collect()
    }

    pub fn rpc_handles(&self) -> Vec<RpcHandle> {
        (0..self.rpc_listeners.len()).map(RpcHandle).collect()
    }

    /// Address tracker of an HTTP listener; clones observe the bind result.
    pub fn http_address(&self, handle: HttpHandle) -> Option<ListenerAddress> {
        self.http_listeners.get(handle.0).map(|l| l.address.clone())
    }

    /// Address tracker of a gRPC listener; clones observe the bind result.
    pub fn rpc_address(&self, handle: RpcHandle) -> Option<ListenerAddress> {
        self.rpc_listeners.get(handle.0).map(|l| l.address.clone())
    }

    pub fn set_database(&mut self, database: Arc<dyn Database>) {
        self.database = Some(database);
    }

    pub fn set_cache(&mut self, cache: Arc<dyn Cache>) {
        self.cache = Some(cache);
    }

    /// Attach a sub-service; names are unique.
    pub fn add_sub_service(&mut self, sub_service: Arc<dyn SubService>) -> Result<(), OptionError> {
        self.ensure_configurable()?;
        let name = sub_service.name().to_string();
        if self.sub_service_index.contains_key(&name) {
            return Err(OptionError::DuplicateSubService(name));
        }

        self.sub_service_index.insert(name, self.sub_services.len());
        self.sub_services.push(sub_service);
        Ok(())
    }

    pub fn sub_service(&self, name: &str) -> Option<Arc<dyn SubService>> {
        self.sub_service_index
            .get(name)
            .map(|&index| self.sub_services[index].clone())
    }

    pub fn add_liveness_checker(&mut self, checker: Checker) {
        self.liveness_checkers.push(checker);
    }

    pub fn set_readiness_interval(&mut self, interval: Option<Duration>) {
        self.readiness_interval = interval;
    }

    pub fn set_probe_settings(&mut self, settings: ProbeSettings) {
        self.probe_settings = settings;
    }

    pub fn set_shutdown_timeout(&mut self, timeout: Duration) {
        self.shutdown_timeout = timeout;
    }

    /// Snapshot of everything the health checks look at.
    pub fn probes(&self) -> Probes {
        Probes {
            rpc: self.rpc_listeners.iter().map(|l| l.address.clone()).collect(),
            http: self.http_listeners.iter().map(|l| l.address.clone()).collect(),
            database: self.database.clone(),
            cache: self.cache.clone(),
            sub_services: self.sub_services.clone(),
            settings: self.probe_settings,
        }
    }

    /// Liveness, evaluated now: the same verdict `/health/live` gives.
    pub async fn is_alive(&self) -> bool {
        self.probes().is_alive().await && all_alive(&self.liveness_checkers).await
    }

    /// Start every listener and the readiness monitor, then wait.
    ///
    /// Returns `Ok(())` on SIGINT/SIGTERM, [`ServiceError::Cancelled`] when the
    /// context is cancelled, and [`ServiceError::Listener`] when a listener fails
    /// to bind or serve. Listeners keep running until [`stop`](Self::stop).
    /// A stopped service cannot be started again.
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        if self.stopped {
            return Err(ServiceError::Stopped);
        }
        let trap = self.signal_trap.take().ok_or(ServiceError::AlreadyStarted)?;
        self.started = true;

        let probes = Arc::new(self.probes());
        let status = StatusContext {
            service_name: Arc::from(self.name.as_str()),
            probes: probes.clone(),
            readiness: self.readiness.clone(),
            checkers: self.liveness_checkers.clone().into(),
            started_at: Instant::now(),
        };

        let listener_count = self.http_listeners.len() + self.rpc_listeners.len();
        let (failures_tx, mut failures_rx) = mpsc::channel(listener_count.max(1));

        for listener in &mut self.http_listeners {
            let Some(app) = listener.app.take() else {
                continue;
            };
            let router = app(&status);
            listener.running = Some(startup::spawn_http(
                listener.address.clone(),
                router,
                failures_tx.clone(),
            ));
        }

        for listener in &mut self.rpc_listeners {
            let routes = std::mem::take(&mut listener.routes).routes();
            let server = std::mem::replace(&mut listener.server, Server::builder());
            listener.running = Some(startup::spawn_rpc(
                listener.address.clone(),
                server,
                routes,
                failures_tx.clone(),
            ));
        }
        drop(failures_tx);

        let monitor = ReadinessMonitor::new(probes, self.readiness.clone(), self.readiness_interval);
        self.readiness_task = Some(tokio::spawn(monitor.run(self.background.clone())));

        tracing::info!(service = %self.name, listeners = listener_count, "Service started");

        let context = self.context.clone();
        tokio::select! {
            trapped = trap.wait(&context) => match trapped {
                Trapped::Signal(signal) => {
                    tracing::info!(signal = %signal, "Termination signal received");
                    Ok(())
                }
                Trapped::Cancelled => {
                    tracing::error!(service = %self.name, "Service context cancelled");
                    Err(ServiceError::Cancelled)
                }
            },
            Some(failure) = failures_rx.recv() => {
                tracing::error!(error = %failure, "Listener failed, leaving start");
                Err(ServiceError::Listener(failure))
            }
        }
    }

    /// Release every resource in the fixed order.
    ///
    /// Each step runs even if earlier ones failed. A second call does nothing
    /// and returns an empty report.
    pub async fn stop(&mut self) -> ShutdownReport {
        let mut report = ShutdownReport::new();
        if self.stopped {
            tracing::debug!(service = %self.name, "Service already stopped");
            return report;
        }
        self.stopped = true;

        self.background.cancel();
        if let Some(task) = self.readiness_task.take() {
            task.abort();
            let _ = task.await;
        }

        report.step(ShutdownStep::SubServices);
        for sub_service in &self.sub_services {
            match sub_service.close().await {
                Ok(()) => tracing::debug!(sub_service = sub_service.name(), "Sub-service stopped"),
                Err(source) => {
                    tracing::error!(sub_service = sub_service.name(), error = %source, "Failed to stop sub-service");
                    report.record(ShutdownError::SubService {
                        name: sub_service.name().to_string(),
                        source,
                    });
                }
            }
        }

        report.step(ShutdownStep::RpcListeners);
        for listener in &mut self.rpc_listeners {
            let address = listener.address.local_addr().unwrap_or(listener.address.configured());
            if let Some(running) = listener.running.take() {
                stop_listener(running, ListenerKind::Rpc, address, self.shutdown_timeout, &mut report).await;
            }
        }

        report.step(ShutdownStep::HttpListeners);
        for listener in &mut self.http_listeners {
            let address = listener.address.local_addr().unwrap_or(listener.address.configured());
            if let Some(running) = listener.running.take() {
                stop_listener(running, ListenerKind::Http, address, self.shutdown_timeout, &mut report).await;
            }
        }

        report.step(ShutdownStep::Database);
        if let Some(database) = &self.database {
            match database.close().await {
                Ok(()) => tracing::debug!("Database stopped"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to close connection to database");
                    report.record(ShutdownError::Database(e));
                }
            }
        }

        report.step(ShutdownStep::Cache);
        if let Some(cache) = &self.cache {
            match cache.close().await {
                Ok(()) => tracing::debug!("Cache stopped"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to close connection to cache");
                    report.record(ShutdownError::Cache(e));
                }
            }
        }

        if !report.is_clean() {
            metrics::record_shutdown_errors(report.errors.len());
        }
        tracing::info!(
            service = %self.name,
            clean = report.is_clean(),
            errors = report.errors.len(),
            "Service stopped"
        );

        report
    }

    /// Start, then stop whatever the outcome of start was.
    ///
    /// A start error wins over the shutdown report; shutdown failures are
    /// still logged.
    pub async fn run(mut self) -> Result<ShutdownReport, ServiceError> {
        let started = self.start().await;
        let report = self.stop().await;
        started.map(|()| report)
    }
}

async fn stop_listener(
    running: RunningListener,
    kind: ListenerKind,
    address: SocketAddr,
    timeout: Duration,
    report: &mut ShutdownReport,
) {
    match running.stop(kind, address, timeout).await {
        Ok(()) => tracing::debug!(kind = %kind, address = %address, "Listener stopped"),
        Err(e) => {
            tracing::error!(kind = %kind, address = %address, error = %e, "Failed to stop listener");
            report.record(e);
        }
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        self.background.cancel();
        let listeners = self
            .http_listeners
            .iter()
            .map(|l| &l.running)
            .chain(self.rpc_listeners.iter().map(|l| &l.running));
        for running in listeners.flatten() {
            running.shutdown.cancel();
        }
    }
}
