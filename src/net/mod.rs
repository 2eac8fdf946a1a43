//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! "ip:port" | ":port"
//!     → listener.rs::parse_address
//!     → ListenerAddress (configured address + bind state)
//!     → lifecycle::startup binds, records the local address
//!     → health probes dial the bound address
//! ```
//!
//! # Design Decisions
//! - Sockets are bound on start, not on construction
//! - Bind state is observable so probes never race the bind

pub mod listener;
