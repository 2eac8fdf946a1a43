//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Liveness (on every /health/live request):
//!     checker.rs (AND over checkers)
//!     → probes.rs::is_alive (listeners + database + cache)
//!
//! Readiness (background task):
//!     monitor.rs
//!     → probes.rs::evaluate_readiness (sub-services + liveness conditions)
//!     → readiness.rs (atomic tri-state flag)
//!
//! Reachability (reachability.rs):
//!     HTTP: TCP connect, bounded retries
//!     RPC:  gRPC handshake, single attempt
//! ```
//!
//! # Design Decisions
//! - Liveness is never cached
//! - Readiness is pending until the first evaluation, and pending reads as not ready
//! - Every probe has a deadline

pub mod checker;
pub mod monitor;
pub mod probes;
pub mod reachability;
pub mod readiness;

pub use checker::{all_alive, checker, Checker};
pub use monitor::ReadinessMonitor;
pub use probes::{ProbeSettings, Probes};
pub use readiness::{Readiness, ReadinessFlag};
