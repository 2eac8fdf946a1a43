//! Shared readiness flag.
//!
//! # States
//! ```text
//! Pending → Ready | NotReady     (first evaluation)
//! Ready ←→ NotReady              (periodic re-evaluation, if enabled)
//! ```
//!
//! Only the readiness task writes the flag. Readers treat `Pending` as not
//! ready.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;

const PENDING: u8 = 0;
const READY: u8 = 1;
const NOT_READY: u8 = 2;

/// Snapshot of the readiness flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// No evaluation has completed yet.
    Pending,
    Ready,
    NotReady,
}

/// Atomic tri-state readiness shared between the evaluator and readers.
#[derive(Debug, Clone, Default)]
pub struct ReadinessFlag {
    state: Arc<AtomicU8>,
}

impl ReadinessFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Readiness {
        match self.state.load(Ordering::Acquire) {
            READY => Readiness::Ready,
            NOT_READY => Readiness::NotReady,
            _ => Readiness::Pending,
        }
    }

    /// True only after an evaluation found everything ready.
    pub fn is_ready(&self) -> bool {
        self.state() == Readiness::Ready
    }

    pub(crate) fn set(&self, ready: bool) {
        let value = if ready { READY } else { NOT_READY };
        self.state.store(value, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_reads_as_not_ready() {
        let flag = ReadinessFlag::new();
        assert_eq!(flag.state(), Readiness::Pending);
        assert!(!flag.is_ready());
    }

    #[test]
    fn test_set_is_shared_between_clones() {
        let flag = ReadinessFlag::new();
        let reader = flag.clone();

        flag.set(true);
        assert!(reader.is_ready());

        flag.set(false);
        assert_eq!(reader.state(), Readiness::NotReady);
        assert!(!reader.is_ready());
    }
}
