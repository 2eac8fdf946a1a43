//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::net::listener::parse_address;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service name must not be empty")]
    EmptyName,

    #[error("invalid {listener} listener address {address:?}: {reason}")]
    InvalidAddress {
        listener: &'static str,
        address: String,
        reason: String,
    },

    #[error("address {0} is used by more than one listener")]
    DuplicateAddress(SocketAddr),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("probes.retry_max_delay_ms must not be below probes.retry_base_delay_ms")]
    RetryBounds,
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }

    let listeners = config
        .listeners
        .status
        .iter()
        .map(|address| ("status", address))
        .chain(config.listeners.rpc.iter().map(|address| ("rpc", address)));

    let mut seen: Vec<SocketAddr> = Vec::new();
    for (listener, address) in listeners {
        match parse_address(address) {
            // Port 0 asks the OS for a fresh port each time, so it never collides.
            Ok(addr) if addr.port() == 0 => {}
            Ok(addr) => {
                if seen.iter().any(|other| collides(*other, addr)) {
                    errors.push(ValidationError::DuplicateAddress(addr));
                }
                seen.push(addr);
            }
            Err(e) => errors.push(ValidationError::InvalidAddress {
                listener,
                address: address.clone(),
                reason: e.reason,
            }),
        }
    }

    let probes = &config.probes;
    if probes.connect_timeout_ms == 0 {
        errors.push(ValidationError::Zero("probes.connect_timeout_ms"));
    }
    if probes.http_attempts == 0 {
        errors.push(ValidationError::Zero("probes.http_attempts"));
    }
    if probes.dependency_timeout_ms == 0 {
        errors.push(ValidationError::Zero("probes.dependency_timeout_ms"));
    }
    if probes.retry_max_delay_ms < probes.retry_base_delay_ms {
        errors.push(ValidationError::RetryBounds);
    }
    if config.readiness.interval_secs == Some(0) {
        errors.push(ValidationError::Zero("readiness.interval_secs"));
    }
    if config.shutdown.grace_period_secs == 0 {
        errors.push(ValidationError::Zero("shutdown.grace_period_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Two binds on the same port conflict when the IPs match or either is a wildcard.
fn collides(a: SocketAddr, b: SocketAddr) -> bool {
    a.port() == b.port() && (a.ip() == b.ip() || a.ip().is_unspecified() || b.ip().is_unspecified())
}
