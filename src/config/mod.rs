//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → ServiceConfig::options() → ordered ServiceOptions → Service::new
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The file is a front-end for options; anything it can express can also be
//!   built in code

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ListenersConfig, ObservabilityConfig, ProbeConfig, ReadinessConfig, ServiceConfig,
    ShutdownConfig,
};
pub use validation::{validate_config, ValidationError};
