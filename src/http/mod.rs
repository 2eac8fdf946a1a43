//! HTTP surface of the internal status listener.
//!
//! # Data Flow
//! ```text
//! GET /health/live, /ready, /health/ready, /metrics, /debug/pprof/*
//!     → status.rs (routes, middleware, handlers)
//!     → response.rs (generic JSON error payload)
//!     → debug.rs (introspection)
//! ```

pub mod debug;
pub mod response;
pub mod status;

pub use response::{answer_with_json_error, ErrorResponse};
pub use status::{status_router, StatusContext};
