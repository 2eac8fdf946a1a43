//! Readiness monitor.
//!
//! # Responsibilities
//! - Wait for listeners to settle their bind attempt
//! - Evaluate readiness and publish it on the shared flag
//! - Optionally repeat on a fixed interval until stopped

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::health::probes::Probes;
use crate::health::readiness::ReadinessFlag;
use crate::observability::metrics;

pub struct ReadinessMonitor {
    probes: Arc<Probes>,
    flag: ReadinessFlag,
    interval: Option<Duration>,
}

impl ReadinessMonitor {
    /// `interval: None` evaluates once and exits.
    pub fn new(probes: Arc<Probes>, flag: ReadinessFlag, interval: Option<Duration>) -> Self {
        Self {
            probes,
            flag,
            interval,
        }
    }

    pub async fn run(self, stop: CancellationToken) {
        tokio::select! {
            _ = self.probes.wait_for_listeners() => {}
            _ = stop.cancelled() => return,
        }

        loop {
            let ready = tokio::select! {
                ready = self.probes.evaluate_readiness() => ready,
                _ = stop.cancelled() => break,
            };

            self.flag.set(ready);
            metrics::record_readiness(ready);
            tracing::info!(ready, "Readiness evaluated");

            let Some(period) = self.interval else {
                break;
            };

            tokio::select! {
                _ = time::sleep(period) => {}
                _ = stop.cancelled() => {
                    tracing::info!("Readiness monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
