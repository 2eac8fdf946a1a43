//! Listener start-up.
//!
//! # Responsibilities
//! - Spawn one task per listener; each task binds once, then serves
//! - Record the bind result on the listener address
//! - Report a terminal failure at most once per listener
//!
//! # Design Decisions
//! - Tasks race to bind; no ordering between listeners
//! - An orderly close (shutdown token) is not a failure
//! - The failure channel is sized to the listener count, so reporting never blocks

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::service::Routes;
use tonic::transport::Server;

use crate::net::listener::{ListenerAddress, ListenerError, ListenerKind, RunningListener};
use crate::observability::metrics;

/// Spawn the serving task of an HTTP listener.
pub(crate) fn spawn_http(
    address: ListenerAddress,
    router: Router,
    failures: mpsc::Sender<ListenerError>,
) -> RunningListener {
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();

    let task = tokio::spawn(async move {
        let Some(listener) = bind(ListenerKind::Http, &address, &failures).await else {
            return;
        };

        tracing::info!(address = %address, "HTTP server started");

        let result = axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(signal.cancelled_owned())
            .await;

        if let Err(e) = result {
            report(
                &failures,
                ListenerError::Serve {
                    kind: ListenerKind::Http,
                    address: address.configured(),
                    reason: e.to_string(),
                },
            )
            .await;
        }

        tracing::info!(address = %address, "HTTP server stopped");
    });

    RunningListener { shutdown, task }
}

/// Spawn the serving task of an RPC listener.
pub(crate) fn spawn_rpc(
    address: ListenerAddress,
    mut server: Server,
    routes: Routes,
    failures: mpsc::Sender<ListenerError>,
) -> RunningListener {
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();

    let task = tokio::spawn(async move {
        let Some(listener) = bind(ListenerKind::Rpc, &address, &failures).await else {
            return;
        };

        tracing::info!(address = %address, "gRPC server started");

        let result = server
            .add_routes(routes)
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), signal.cancelled_owned())
            .await;

        if let Err(e) = result {
            report(
                &failures,
                ListenerError::Serve {
                    kind: ListenerKind::Rpc,
                    address: address.configured(),
                    reason: e.to_string(),
                },
            )
            .await;
        }

        tracing::info!(address = %address, "gRPC server stopped");
    });

    RunningListener { shutdown, task }
}

async fn bind(
    kind: ListenerKind,
    address: &ListenerAddress,
    failures: &mpsc::Sender<ListenerError>,
) -> Option<TcpListener> {
    let listener = match TcpListener::bind(address.configured()).await {
        Ok(listener) => listener,
        Err(source) => {
            address.mark_failed();
            report(
                failures,
                ListenerError::Bind {
                    kind,
                    address: address.configured(),
                    source,
                },
            )
            .await;
            return None;
        }
    };

    match listener.local_addr() {
        Ok(local) => address.mark_bound(local),
        Err(_) => address.mark_bound(address.configured()),
    }

    tracing::debug!(kind = %kind, address = %address, "Listener bound");
    Some(listener)
}

async fn report(failures: &mpsc::Sender<ListenerError>, error: ListenerError) {
    let kind = match &error {
        ListenerError::Bind { kind, .. } | ListenerError::Serve { kind, .. } => *kind,
    };
    tracing::error!(kind = %kind, error = %error, "Listener failed");
    metrics::record_listener_failure(kind);

    if failures.send(error).await.is_err() {
        tracing::debug!(kind = %kind, "Listener failure not delivered, service no longer waiting");
    }
}
