//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT/SIGTERM handlers when the trap is created
//! - Resolve once: on a signal, or when the service token is cancelled
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are installed eagerly so a signal that arrives before the
//!   wait starts is still observed
//! - `wait` consumes the trap; re-arming is not supported

use std::fmt;

use tokio_util::sync::CancellationToken;

/// Which termination signal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for TermSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermSignal::Interrupt => f.write_str("SIGINT"),
            TermSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// How a [`SignalTrap`] resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trapped {
    /// A termination signal arrived; the expected way for a service to end.
    Signal(TermSignal),
    /// The service token was cancelled before any signal.
    Cancelled,
}

/// Single-shot wait for a termination signal.
#[cfg(unix)]
pub struct SignalTrap {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalTrap {
    /// Install the handlers. Must be called from within a Tokio runtime.
    pub fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for SIGINT/SIGTERM or for `cancel`, whichever comes first.
    pub async fn wait(mut self, cancel: &CancellationToken) -> Trapped {
        tokio::select! {
            _ = self.interrupt.recv() => Trapped::Signal(TermSignal::Interrupt),
            _ = self.terminate.recv() => Trapped::Signal(TermSignal::Terminate),
            _ = cancel.cancelled() => Trapped::Cancelled,
        }
    }
}

/// Single-shot wait for a termination signal.
#[cfg(not(unix))]
pub struct SignalTrap {
    _private: (),
}

#[cfg(not(unix))]
impl SignalTrap {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self { _private: () })
    }

    pub async fn wait(self, cancel: &CancellationToken) -> Trapped {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => Trapped::Signal(TermSignal::Interrupt),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C, waiting for cancellation");
                    cancel.cancelled().await;
                    Trapped::Cancelled
                }
            },
            _ = cancel.cancelled() => Trapped::Cancelled,
        }
    }
}

impl fmt::Debug for SignalTrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalTrap").finish_non_exhaustive()
    }
}
