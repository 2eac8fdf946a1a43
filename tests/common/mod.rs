//! Shared fakes and helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use service_lifecycle::{BoxError, Cache, Database, ListenerAddress, SubService, CACHE_PONG};

/// Ordered record of close calls, shared between fakes.
#[derive(Clone, Default)]
pub struct CloseLog(Arc<Mutex<Vec<String>>>);

impl CloseLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct FakeDatabase {
    pub log: CloseLog,
    pub healthy: AtomicBool,
}

impl FakeDatabase {
    pub fn new(log: &CloseLog) -> Arc<Self> {
        Arc::new(Self {
            log: log.clone(),
            healthy: AtomicBool::new(true),
        })
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn ping(&self) -> Result<(), BoxError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err("database unreachable".into())
        }
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.log.push("database");
        Ok(())
    }
}

pub struct FakeCache {
    pub log: CloseLog,
}

impl FakeCache {
    pub fn new(log: &CloseLog) -> Arc<Self> {
        Arc::new(Self { log: log.clone() })
    }
}

#[async_trait]
impl Cache for FakeCache {
    async fn ping(&self) -> Result<String, BoxError> {
        Ok(CACHE_PONG.to_string())
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.log.push("cache");
        Ok(())
    }
}

pub struct FakeSubService {
    pub name: String,
    pub log: CloseLog,
    pub ready: AtomicBool,
    pub fail_close: bool,
    pub closes: AtomicUsize,
}

impl FakeSubService {
    pub fn new(name: &str, log: &CloseLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: log.clone(),
            ready: AtomicBool::new(true),
            fail_close: false,
            closes: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &str, log: &CloseLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: log.clone(),
            ready: AtomicBool::new(true),
            fail_close: true,
            closes: AtomicUsize::new(0),
        })
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubService for FakeSubService {
    async fn ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("sub:{}", self.name));
        if self.fail_close {
            Err(format!("{} refused to close", self.name).into())
        } else {
            Ok(())
        }
    }
}

/// Wait for a listener to bind and return the address to dial.
pub async fn bound(address: &ListenerAddress) -> SocketAddr {
    tokio::time::timeout(Duration::from_secs(5), address.settled())
        .await
        .expect("listener did not settle");
    assert!(address.local_addr().is_some(), "listener failed to bind");
    address.probe_target()
}

/// Poll `url` until it answers `expected` or the deadline passes.
pub async fn wait_for_status(url: &str, expected: u16) -> bool {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(res) = client.get(url).send().await {
            if res.status().as_u16() == expected {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}
