//! External collaborators the service reports on and tears down.
//!
//! The service never looks inside these; it only needs to know whether they
//! answer and how to close them.
//!
//! ```text
//! Database  → ping / close
//! Cache     → ping ("PONG") / close
//! SubService → ready / name / close
//! ```

use async_trait::async_trait;

/// Error type returned by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reply a healthy cache gives to a ping.
pub const CACHE_PONG: &str = "PONG";

/// A database-like dependency handle.
#[async_trait]
pub trait Database: Send + Sync {
    /// Round-trip to the database.
    async fn ping(&self) -> Result<(), BoxError>;

    /// Release the underlying connections.
    async fn close(&self) -> Result<(), BoxError>;
}

/// A cache-like dependency handle.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Round-trip to the cache; a healthy cache answers [`CACHE_PONG`].
    async fn ping(&self) -> Result<String, BoxError>;

    /// Release the underlying connections.
    async fn close(&self) -> Result<(), BoxError>;
}

/// A dependent unit owned by the process that reports its own readiness.
#[async_trait]
pub trait SubService: Send + Sync {
    /// Whether the unit can take work.
    async fn ready(&self) -> bool;

    /// Unique name, used as the registration key.
    fn name(&self) -> &str;

    /// Tear the unit down.
    async fn close(&self) -> Result<(), BoxError>;
}
