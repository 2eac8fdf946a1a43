//! Errors raised while configuring and running a service.

use thiserror::Error;

use crate::dependency::BoxError;
use crate::net::listener::{AddressError, ListenerError, RpcHandle};
use crate::observability::metrics::MetricsError;

/// A configuration option that could not be applied.
#[derive(Debug, Error)]
pub enum OptionError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("sub-service {0:?} is already registered")]
    DuplicateSubService(String),

    #[error("no RPC listener for {0:?}")]
    UnknownRpcListener(RpcHandle),

    #[error("service already started, configuration is frozen")]
    AlreadyStarted,

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// Failure of a caller-defined option.
    #[error("{0}")]
    Other(BoxError),
}

/// Why [`Service::new`](crate::Service::new) or
/// [`Service::start`](crate::Service::start) returned early.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid service option: {0}")]
    Option(#[from] OptionError),

    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("service context cancelled")]
    Cancelled,

    #[error("service already started")]
    AlreadyStarted,

    #[error("service already stopped")]
    Stopped,
}
