//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SAMPLE: &str = r#"
name = "orders"

[listeners]
status = ":5051"
rpc = ["127.0.0.1:8080"]

[probes]
http_attempts = 3

[readiness]
interval_secs = 15
"#;

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.name, "orders");
        assert_eq!(config.listeners.status.as_deref(), Some(":5051"));
        assert_eq!(config.listeners.rpc, vec!["127.0.0.1:8080".to_string()]);
        assert_eq!(config.probes.http_attempts, 3);
        assert_eq!(config.probes.connect_timeout_ms, 1000);
        assert_eq!(config.readiness.interval(), Some(Duration::from_secs(15)));
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let err = parse_config("name = \"\"\n[probes]\nhttp_attempts = 0\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: service name must not be empty, probes.http_attempts must be greater than zero"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/service.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let path = std::env::temp_dir().join(format!("service-lifecycle-{}.toml", std::process::id()));
        fs::write(&path, SAMPLE).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.name, "orders");

        let _ = fs::remove_file(&path);
    }
}
