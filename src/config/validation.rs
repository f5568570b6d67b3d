//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, connection limits > 0)
//! - Check the log level is one the subscriber understands
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::GatewayConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("common.runtime_path must not be empty")]
    EmptyRuntimePath,

    #[error("listener.header_read_timeout_secs must be greater than zero")]
    ZeroHeaderTimeout,

    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("logging.level {0:?} is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),

    #[error("logging.save_name must not be empty when logging.path is set")]
    EmptyLogName,
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.common.runtime_path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyRuntimePath);
    }
    if config.listener.header_read_timeout_secs == 0 {
        errors.push(ValidationError::ZeroHeaderTimeout);
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.logging.level.clone()));
    }
    if config.logging.path.is_some() && config.logging.save_name.trim().is_empty() {
        errors.push(ValidationError::EmptyLogName);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = GatewayConfig::default();
        config.common.runtime_path = PathBuf::new();
        config.listener.max_connections = 0;
        config.logging.level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyRuntimePath,
                ValidationError::ZeroMaxConnections,
                ValidationError::UnknownLogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn log_name_required_only_for_file_logging() {
        let mut config = GatewayConfig::default();
        config.logging.save_name = String::new();
        assert!(validate_config(&config).is_ok());

        config.logging.path = Some(PathBuf::from("/var/log/gw"));
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::EmptyLogName]
        );
    }
}
