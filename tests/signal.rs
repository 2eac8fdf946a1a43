//! SIGTERM handling. Kept in its own binary: the signal hits the whole process.

#![cfg(unix)]

use std::time::Duration;

use service_lifecycle::options::{with_rpc_server, with_status_server, with_sub_service};
use service_lifecycle::Service;

mod common;
use common::{CloseLog, FakeSubService};

#[tokio::test]
async fn test_sigterm_runs_orderly_shutdown() {
    let log = CloseLog::default();
    let worker = FakeSubService::new("worker", &log);

    let service = Service::new(
        "signalled",
        [
            with_rpc_server("127.0.0.1:0"),
            with_status_server("127.0.0.1:0"),
            with_sub_service(worker.clone()),
        ],
    )
    .unwrap();
    let status = service.http_address(service.http_handles()[0]).unwrap();

    let running = tokio::spawn(service.run());
    let target = common::bound(&status).await;
    assert!(common::wait_for_status(&format!("http://{}/ready", target), 200).await);

    let pid = std::process::id().to_string();
    let killed = std::process::Command::new("kill")
        .args(["-TERM", &pid])
        .status()
        .unwrap();
    assert!(killed.success());

    let report = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("service should stop promptly after SIGTERM")
        .unwrap()
        .expect("a signal is a normal way to end");

    assert!(report.is_clean());
    assert_eq!(worker.close_count(), 1);
    assert_eq!(log.entries(), vec!["sub:worker"]);
}
