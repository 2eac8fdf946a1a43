//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     One task per listener → bind → serve → report failure once
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT or token cancellation → wake the waiting service
//!
//! Shutdown (shutdown.rs):
//!     Sub-services → RPC listeners → HTTP listeners → database → cache
//!     Failures collected into a report, never abort the sequence
//! ```
//!
//! # Design Decisions
//! - Listeners start concurrently; shutdown is strictly sequential
//! - Shutdown has a per-listener drain deadline
//! - Process exit is the caller's decision

pub mod shutdown;
pub mod signals;
pub(crate) mod startup;

pub use shutdown::{ShutdownError, ShutdownReport, ShutdownStep};
pub use signals::{SignalTrap, TermSignal, Trapped};
