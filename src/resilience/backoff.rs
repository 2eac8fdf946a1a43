//! Exponential backoff with jitter for probe retries.

use rand::Rng;
use std::time::Duration;

/// Delay before retry number `attempt` (1-based) of a reachability probe.
///
/// Doubles from `base` up to `max`, plus up to 10% jitter so that several
/// probes started together do not hammer a listener in lockstep.
pub fn probe_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let base_ms = base.as_millis() as u64;
    let max_ms = max.as_millis() as u64;

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let capped_delay = base_ms.saturating_mul(exponential_base).min(max_ms);

    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}
