//! Service lifecycle library.
//!
//! Builds a process out of HTTP and gRPC listeners plus external
//! dependencies, reports liveness and readiness, and tears everything down in
//! a fixed order on SIGINT/SIGTERM.

pub mod config;
pub mod dependency;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod service;

pub use config::ServiceConfig;
pub use dependency::{BoxError, Cache, Database, SubService, CACHE_PONG};
pub use health::{checker, Checker, ProbeSettings, Readiness, ReadinessFlag};
pub use lifecycle::{ShutdownError, ShutdownReport, ShutdownStep};
pub use net::listener::{HttpHandle, ListenerAddress, ListenerError, ListenerKind, RpcHandle};
pub use service::{options, OptionError, Service, ServiceError, ServiceOption};
