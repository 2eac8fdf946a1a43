//! Listener descriptors owned by the service.
//!
//! # Responsibilities
//! - Parse and hold the configured bind address
//! - Track the bind state so probes dial the real bound socket
//! - Hold the transport handle (router factory or RPC server) until start
//! - Stop a running listener within a drain deadline

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::service::RoutesBuilder;
use tonic::transport::Server;

use crate::http::StatusContext;
use crate::lifecycle::shutdown::ShutdownError;

/// The two kinds of endpoint the service can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Request/response endpoint served by axum.
    Http,
    /// Remote-procedure endpoint served by tonic.
    Rpc,
}

impl ListenerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListenerKind::Http => "http",
            ListenerKind::Rpc => "rpc",
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a listener task. Each task reports at most one.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("{kind} listener failed to bind {address}: {source}")]
    Bind {
        kind: ListenerKind,
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Serving stopped with an error other than an orderly close.
    #[error("{kind} listener on {address} failed to serve: {reason}")]
    Serve {
        kind: ListenerKind,
        address: SocketAddr,
        reason: String,
    },
}

/// Address string that could not be turned into a socket address.
#[derive(Debug, Error)]
#[error("invalid listener address {address:?}: {reason}")]
pub struct AddressError {
    pub address: String,
    pub reason: String,
}

/// Parse a listener address.
///
/// Accepts `ip:port` and the `:port` shorthand for all IPv4 interfaces.
pub fn parse_address(address: &str) -> Result<SocketAddr, AddressError> {
    let trimmed = address.trim();
    let normalized = if trimmed.starts_with(':') {
        format!("0.0.0.0{trimmed}")
    } else {
        trimmed.to_string()
    };

    normalized.parse().map_err(|e: std::net::AddrParseError| AddressError {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Where a listener is in its bind attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindState {
    Pending,
    Bound(SocketAddr),
    Failed,
}

/// Configured address of a listener plus its observed bind state.
///
/// Clones share the bind state, so the serving task and the probes see the
/// same socket.
#[derive(Debug, Clone)]
pub struct ListenerAddress {
    configured: SocketAddr,
    state: Arc<watch::Sender<BindState>>,
}

impl ListenerAddress {
    pub fn new(configured: SocketAddr) -> Self {
        let (tx, _) = watch::channel(BindState::Pending);
        Self {
            configured,
            state: Arc::new(tx),
        }
    }

    /// The address the listener was configured with.
    pub fn configured(&self) -> SocketAddr {
        self.configured
    }

    pub fn state(&self) -> BindState {
        *self.state.borrow()
    }

    /// The bound socket address, once the bind succeeded.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self.state() {
            BindState::Bound(addr) => Some(addr),
            _ => None,
        }
    }

    pub(crate) fn mark_bound(&self, addr: SocketAddr) {
        self.state.send_replace(BindState::Bound(addr));
    }

    pub(crate) fn mark_failed(&self) {
        self.state.send_replace(BindState::Failed);
    }

    /// Wait until the bind attempt has either succeeded or failed.
    pub async fn settled(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state != BindState::Pending).await;
    }

    /// Address a probe should dial.
    ///
    /// Uses the bound address when known; wildcard IPs become loopback.
    pub fn probe_target(&self) -> SocketAddr {
        let mut addr = self.local_addr().unwrap_or(self.configured);
        if addr.ip().is_unspecified() {
            let loopback: IpAddr = match addr.ip() {
                IpAddr::V4(_) => Ipv4Addr::LOCALHOST.into(),
                IpAddr::V6(_) => Ipv6Addr::LOCALHOST.into(),
            };
            addr.set_ip(loopback);
        }
        addr
    }
}

impl fmt::Display for ListenerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.local_addr() {
            Some(addr) => write!(f, "{addr}"),
            None => write!(f, "{}", self.configured),
        }
    }
}

/// Opaque reference to an HTTP listener, returned when it is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpHandle(pub(crate) usize);

/// Opaque reference to an RPC listener, used to attach services to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RpcHandle(pub(crate) usize);

/// Builds the router of an HTTP listener once the service starts.
pub(crate) type AppFactory = Box<dyn FnOnce(&StatusContext) -> Router + Send>;

/// A spawned serving task and the token that asks it to drain.
pub(crate) struct RunningListener {
    pub(crate) shutdown: CancellationToken,
    pub(crate) task: JoinHandle<()>,
}

impl RunningListener {
    /// Ask the task to drain and wait for it, aborting it after `timeout`.
    pub(crate) async fn stop(
        self,
        kind: ListenerKind,
        address: SocketAddr,
        timeout: Duration,
    ) -> Result<(), ShutdownError> {
        self.shutdown.cancel();

        let mut task = self.task;
        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ShutdownError::Panicked {
                kind,
                address,
                reason: e.to_string(),
            }),
            Err(_) => {
                task.abort();
                Err(ShutdownError::Timeout {
                    kind,
                    address,
                    timeout,
                })
            }
        }
    }
}

/// Request/response listener descriptor.
pub(crate) struct HttpListener {
    pub(crate) address: ListenerAddress,
    pub(crate) app: Option<AppFactory>,
    pub(crate) running: Option<RunningListener>,
}

impl HttpListener {
    pub(crate) fn new(address: SocketAddr, app: AppFactory) -> Self {
        Self {
            address: ListenerAddress::new(address),
            app: Some(app),
            running: None,
        }
    }
}

/// Remote-procedure listener descriptor.
///
/// The tonic server is created with the descriptor; only the socket bind
/// waits for start.
pub(crate) struct RpcListener {
    pub(crate) address: ListenerAddress,
    pub(crate) server: Server,
    pub(crate) routes: RoutesBuilder,
    pub(crate) running: Option<RunningListener>,
}

impl RpcListener {
    pub(crate) fn new(address: SocketAddr) -> Self {
        Self {
            address: ListenerAddress::new(address),
            server: Server::builder(),
            routes: RoutesBuilder::default(),
            running: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_forms() {
        assert_eq!(
            parse_address("127.0.0.1:8080").unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_address(":5051").unwrap(),
            "0.0.0.0:5051".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_address("[::1]:9000").unwrap(),
            "[::1]:9000".parse::<SocketAddr>().unwrap()
        );

        let err = parse_address("not-an-address").unwrap_err();
        assert_eq!(err.address, "not-an-address");
    }

    #[test]
    fn test_probe_target_uses_loopback_for_wildcard() {
        let address = ListenerAddress::new(parse_address(":7000").unwrap());
        assert_eq!(address.probe_target(), "127.0.0.1:7000".parse::<SocketAddr>().unwrap());

        address.mark_bound("0.0.0.0:7001".parse().unwrap());
        assert_eq!(address.probe_target(), "127.0.0.1:7001".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_settled_after_bind_result() {
        let address = ListenerAddress::new("127.0.0.1:0".parse().unwrap());
        assert_eq!(address.state(), BindState::Pending);
        assert!(address.local_addr().is_none());

        let shared = address.clone();
        let waiter = tokio::spawn(async move { shared.settled().await });

        address.mark_bound("127.0.0.1:4321".parse().unwrap());
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("settled should resolve")
            .unwrap();

        assert_eq!(address.local_addr(), Some("127.0.0.1:4321".parse().unwrap()));
        assert_eq!(address.to_string(), "127.0.0.1:4321");
    }
}
