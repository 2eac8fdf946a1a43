//! Start-up, failure and shutdown ordering over real sockets.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use service_lifecycle::health::reachability::rpc_reachable;
use service_lifecycle::options::{
    with_cache, with_context, with_database, with_http_server, with_rpc_server,
    with_shutdown_timeout, with_status_server, with_sub_service,
};
use service_lifecycle::{
    ListenerError, OptionError, ProbeSettings, Service, ServiceError, ServiceOption,
    ShutdownError, ShutdownStep,
};
use tokio_util::sync::CancellationToken;
use tonic::transport::Endpoint;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::{HealthCheckRequest, HealthCheckResponse};

mod common;
use common::{CloseLog, FakeCache, FakeDatabase, FakeSubService};

#[tokio::test]
async fn test_cancelled_context_ends_start() {
    let context = CancellationToken::new();
    let mut service = Service::new(
        "cancelled",
        [with_context(context.clone()), with_rpc_server("127.0.0.1:0")],
    )
    .unwrap();

    let canceller = context.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), service.start())
        .await
        .expect("start should return after cancellation");
    assert!(matches!(result, Err(ServiceError::Cancelled)));

    assert!(service.stop().await.is_clean());
}

#[tokio::test]
async fn test_shutdown_order_and_failure_isolation() {
    let log = CloseLog::default();
    let context = CancellationToken::new();
    context.cancel();

    let service = Service::new(
        "ordered-shutdown",
        [
            with_context(context),
            with_rpc_server("127.0.0.1:0"),
            with_http_server("127.0.0.1:0", Router::new()),
            with_database(FakeDatabase::new(&log)),
            with_cache(FakeCache::new(&log)),
            with_sub_service(FakeSubService::failing("indexer", &log)),
            with_sub_service(FakeSubService::new("mailer", &log)),
        ],
    )
    .unwrap();

    let rpc = service.rpc_address(service.rpc_handles()[0]).unwrap();
    let http = service.http_address(service.http_handles()[0]).unwrap();

    let mut service = service;
    assert!(matches!(service.start().await, Err(ServiceError::Cancelled)));
    common::bound(&rpc).await;
    let http_target = common::bound(&http).await;

    let report = service.stop().await;
    assert_eq!(report.steps, ShutdownStep::ORDER.to_vec());
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        &report.errors[0],
        ShutdownError::SubService { name, .. } if name == "indexer"
    ));
    assert!(!report.is_clean());

    assert_eq!(
        log.entries(),
        vec!["sub:indexer", "sub:mailer", "database", "cache"]
    );

    assert!(
        tokio::net::TcpStream::connect(http_target).await.is_err(),
        "HTTP listener should be closed after stop"
    );
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let log = CloseLog::default();
    let sub_service = FakeSubService::new("worker", &log);
    let mut service = Service::new(
        "idempotent",
        [with_sub_service(sub_service.clone()), with_database(FakeDatabase::new(&log))],
    )
    .unwrap();

    let first = service.stop().await;
    assert_eq!(first.steps.len(), 5);
    let second = service.stop().await;
    assert!(second.steps.is_empty());
    assert!(second.is_clean());

    assert_eq!(sub_service.close_count(), 1);
    assert_eq!(log.entries(), vec!["sub:worker", "database"]);
}

#[tokio::test]
async fn test_bind_conflict_fails_start() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let taken = occupied.local_addr().unwrap();

    let mut service = Service::new(
        "conflict",
        [with_http_server(taken.to_string(), Router::new())],
    )
    .unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), service.start())
        .await
        .expect("start should fail fast on bind conflict");
    match result {
        Err(ServiceError::Listener(ListenerError::Bind { address, .. })) => {
            assert_eq!(address, taken)
        }
        other => panic!("expected bind failure, got {:?}", other),
    }

    service.stop().await;
}

#[tokio::test]
async fn test_every_listener_is_bound() {
    let context = CancellationToken::new();
    context.cancel();
    let app = Router::new().route("/hello", get(|| async { "hello" }));

    let mut service = Service::new(
        "many",
        [
            with_context(context),
            with_rpc_server("127.0.0.1:0"),
            with_rpc_server("127.0.0.1:0"),
            with_http_server("127.0.0.1:0", app),
            with_status_server("127.0.0.1:0"),
            with_shutdown_timeout(Duration::from_secs(2)),
        ],
    )
    .unwrap();

    let rpc: Vec<_> = service
        .rpc_handles()
        .into_iter()
        .filter_map(|h| service.rpc_address(h))
        .collect();
    let http: Vec<_> = service
        .http_handles()
        .into_iter()
        .filter_map(|h| service.http_address(h))
        .collect();
    assert_eq!(rpc.len(), 2);
    assert_eq!(http.len(), 2);

    let _ = service.start().await;

    for address in &rpc {
        let target = common::bound(address).await;
        assert!(rpc_reachable(target, &ProbeSettings::default()).await);
    }

    let app_target = common::bound(&http[0]).await;
    let body = reqwest::get(format!("http://{}/hello", app_target))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "hello");

    let status_target = common::bound(&http[1]).await;
    assert!(common::wait_for_status(&format!("http://{}/ready", status_target), 200).await);

    assert!(service.stop().await.is_clean());
}

#[tokio::test]
async fn test_construction_errors() {
    let log = CloseLog::default();

    let duplicate = Service::new(
        "dupes",
        [
            with_sub_service(FakeSubService::new("worker", &log)),
            with_sub_service(FakeSubService::new("worker", &log)),
        ],
    );
    assert!(matches!(
        duplicate,
        Err(ServiceError::Option(OptionError::DuplicateSubService(_)))
    ));

    let invalid = Service::new("invalid", [with_status_server("localhost")]);
    assert!(matches!(
        invalid,
        Err(ServiceError::Option(OptionError::Address(_)))
    ));

    let later_ran = Arc::new(AtomicBool::new(false));
    let flag = later_ran.clone();
    let custom = Service::new(
        "custom",
        [
            ServiceOption::new(|_| Err(OptionError::Other("license key missing".into()))),
            ServiceOption::new(move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }),
        ],
    );
    match custom {
        Err(ServiceError::Option(OptionError::Other(e))) => {
            assert_eq!(e.to_string(), "license key missing")
        }
        other => panic!("expected custom option failure, got {:?}", other.err()),
    }
    assert!(!later_ran.load(Ordering::SeqCst), "options after a failure must not run");

    assert!(log.entries().is_empty());
}

async fn grpc_health(target: SocketAddr) -> Result<HealthCheckResponse, tonic::Status> {
    let channel = Endpoint::from_shared(format!("http://{}", target))
        .unwrap()
        .connect()
        .await
        .unwrap();

    HealthClient::new(channel)
        .check(HealthCheckRequest {
            service: String::new(),
        })
        .await
        .map(tonic::Response::into_inner)
}

#[tokio::test]
async fn test_rpc_services_are_served_on_their_listener() {
    let context = CancellationToken::new();
    context.cancel();
    let mut service = Service::new(
        "grpc-routes",
        [
            with_context(context),
            with_rpc_server("127.0.0.1:0"),
            with_rpc_server("127.0.0.1:0"),
        ],
    )
    .unwrap();

    let handles = service.rpc_handles();
    let (_reporter, health_service) = tonic_health::server::health_reporter();
    service.rpc_routes(handles[1]).unwrap().add_service(health_service);

    let bare = service.rpc_address(handles[0]).unwrap();
    let served = service.rpc_address(handles[1]).unwrap();

    let _ = service.start().await;
    let bare = common::bound(&bare).await;
    let served = common::bound(&served).await;

    let response = grpc_health(served).await.unwrap();
    assert_eq!(response.status, ServingStatus::Serving as i32);

    let status = grpc_health(bare).await.unwrap_err();
    assert_eq!(status.code(), tonic::Code::Unimplemented);

    assert!(service.stop().await.is_clean());
}

#[tokio::test]
async fn test_sub_service_readiness_gates_ready() {
    let log = CloseLog::default();
    let sub_service = FakeSubService::new("warming", &log);
    sub_service.ready.store(false, Ordering::SeqCst);

    let context = CancellationToken::new();
    context.cancel();
    let mut service = Service::new(
        "gated",
        [
            with_context(context),
            with_status_server("127.0.0.1:0"),
            with_sub_service(sub_service.clone()),
        ],
    )
    .unwrap();
    let readiness = service.readiness();
    let status = service.http_address(service.http_handles()[0]).unwrap();

    let _ = service.start().await;
    let target = common::bound(&status).await;

    assert!(common::wait_for_status(&format!("http://{}/ready", target), 503).await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!readiness.is_ready());

    service.stop().await;
}
