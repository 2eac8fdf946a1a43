//! Composable configuration options.
//!
//! An option is a one-shot mutation of a service that has not started yet.
//! [`Service::new`] applies options in order and stops at the first failure.
//!
//! ```no_run
//! # async fn demo() -> Result<(), service_lifecycle::ServiceError> {
//! use service_lifecycle::{Service, options::{with_rpc_server, with_status_server}};
//!
//! let service = Service::new("orders", [
//!     with_rpc_server(":8080"),
//!     with_status_server(":5051"),
//! ])?;
//! let report = service.run().await?;
//! # Ok(()) }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::dependency::{Cache, Database, SubService};
use crate::health::{Checker, ProbeSettings};
use crate::service::error::OptionError;
use crate::service::Service;

type ApplyFn = Box<dyn FnOnce(&mut Service) -> Result<(), OptionError> + Send>;

/// A unit of configuration applied to a [`Service`] before it starts.
pub struct ServiceOption(ApplyFn);

impl ServiceOption {
    /// Wrap a custom mutation as an option.
    pub fn new<F>(apply: F) -> Self
    where
        F: FnOnce(&mut Service) -> Result<(), OptionError> + Send + 'static,
    {
        Self(Box::new(apply))
    }

    pub fn apply(self, service: &mut Service) -> Result<(), OptionError> {
        (self.0)(service)
    }
}

impl fmt::Debug for ServiceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceOption").finish_non_exhaustive()
    }
}

/// Add a gRPC listener. The server is created now, the socket is bound on start.
pub fn with_rpc_server(address: impl Into<String>) -> ServiceOption {
    let address = address.into();
    ServiceOption::new(move |service| service.add_rpc_server(&address).map(drop))
}

/// Add the internal status listener (liveness, readiness, metrics, debug).
pub fn with_status_server(address: impl Into<String>) -> ServiceOption {
    let address = address.into();
    ServiceOption::new(move |service| service.add_status_server(&address).map(drop))
}

/// Add an application HTTP listener serving `router`.
pub fn with_http_server(address: impl Into<String>, router: Router) -> ServiceOption {
    let address = address.into();
    ServiceOption::new(move |service| service.add_http_server(&address, router).map(drop))
}

pub fn with_database(database: Arc<dyn Database>) -> ServiceOption {
    ServiceOption::new(move |service| {
        service.set_database(database);
        Ok(())
    })
}

pub fn with_cache(cache: Arc<dyn Cache>) -> ServiceOption {
    ServiceOption::new(move |service| {
        service.set_cache(cache);
        Ok(())
    })
}

/// Attach a sub-service. Fails if the name is already taken.
pub fn with_sub_service(sub_service: Arc<dyn SubService>) -> ServiceOption {
    ServiceOption::new(move |service| service.add_sub_service(sub_service))
}

/// Extra checker ANDed into `/health/live`.
pub fn with_liveness_checker(checker: Checker) -> ServiceOption {
    ServiceOption::new(move |service| {
        service.add_liveness_checker(checker);
        Ok(())
    })
}

/// Replace the cancellation token the service waits on.
pub fn with_context(context: CancellationToken) -> ServiceOption {
    ServiceOption::new(move |service| {
        service.set_context(context);
        Ok(())
    })
}

/// Re-evaluate readiness every `interval` instead of once.
pub fn with_readiness_interval(interval: Duration) -> ServiceOption {
    ServiceOption::new(move |service| {
        service.set_readiness_interval(Some(interval));
        Ok(())
    })
}

pub fn with_probe_settings(settings: ProbeSettings) -> ServiceOption {
    ServiceOption::new(move |service| {
        service.set_probe_settings(settings);
        Ok(())
    })
}

/// How long each listener may take to drain during stop.
pub fn with_shutdown_timeout(timeout: Duration) -> ServiceOption {
    ServiceOption::new(move |service| {
        service.set_shutdown_timeout(timeout);
        Ok(())
    })
}
