//! Listener reachability probes.
//!
//! # Design Decisions
//! - HTTP: raw TCP connect, bounded retries with jittered backoff
//! - RPC: a single gRPC (HTTP/2) connection attempt, no retry
//! - Both return a definite answer within a bounded time

use std::net::SocketAddr;

use tokio::net::TcpStream;
use tokio::time;
use tonic::transport::Endpoint;

use crate::health::probes::ProbeSettings;
use crate::resilience::probe_backoff;

/// Whether an HTTP listener accepts TCP connections.
pub async fn http_reachable(target: SocketAddr, settings: &ProbeSettings) -> bool {
    let attempts = settings.http_attempts.max(1);

    for attempt in 1..=attempts {
        match time::timeout(settings.connect_timeout, TcpStream::connect(target)).await {
            Ok(Ok(_stream)) => {
                tracing::debug!(address = %target, attempt, "HTTP server reachable");
                return true;
            }
            Ok(Err(e)) => {
                tracing::debug!(address = %target, attempt, error = %e, "HTTP server not reachable");
            }
            Err(_) => {
                tracing::debug!(address = %target, attempt, "HTTP server connect timed out");
            }
        }

        if attempt < attempts {
            let delay = probe_backoff(attempt, settings.retry_base_delay, settings.retry_max_delay);
            time::sleep(delay).await;
        }
    }

    tracing::warn!(address = %target, attempts, "HTTP server unreachable");
    false
}

/// Whether an RPC listener completes a gRPC connection handshake.
pub async fn rpc_reachable(target: SocketAddr, settings: &ProbeSettings) -> bool {
    let endpoint = match Endpoint::from_shared(format!("http://{target}")) {
        Ok(endpoint) => endpoint.connect_timeout(settings.connect_timeout),
        Err(e) => {
            tracing::debug!(address = %target, error = %e, "Invalid gRPC endpoint");
            return false;
        }
    };

    match time::timeout(settings.connect_timeout, endpoint.connect()).await {
        Ok(Ok(_channel)) => {
            tracing::debug!(address = %target, "gRPC server ready");
            true
        }
        Ok(Err(e)) => {
            tracing::debug!(address = %target, error = %e, "gRPC server not reachable");
            false
        }
        Err(_) => {
            tracing::debug!(address = %target, "gRPC connect timed out");
            false
        }
    }
}
