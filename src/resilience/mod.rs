//! Resilience helpers shared by the probes.
//!
//! # Design Decisions
//! - Every probe has a deadline; reachability is a definite yes/no
//! - Retries are bounded and jittered

pub mod backoff;

pub use backoff::probe_backoff;
