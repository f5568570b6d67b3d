//! Configuration loading from disk.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Name of the configuration file searched for in each candidate directory.
pub const CONFIG_FILE_NAME: &str = "gateway.toml";

/// Environment variable naming an extra directory to search.
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG_PATH";

/// System-wide configuration directory, searched last.
pub const SYSTEM_CONFIG_DIR: &str = "/etc/route-gateway";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

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

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Write configuration back to disk, atomically replacing the previous file.
pub fn save_config(path: &Path, config: &GatewayConfig) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// Directories searched for `gateway.toml`, in priority order.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    match std::env::current_dir() {
        Ok(cwd) => {
            dirs.push(cwd.join("conf"));
            dirs.insert(0, cwd);
        }
        Err(e) => tracing::warn!(error = %e, "Cannot determine working directory"),
    }

    if let Some(dir) = std::env::var_os(CONFIG_PATH_ENV) {
        dirs.push(PathBuf::from(dir));
    }
    dirs.push(PathBuf::from(SYSTEM_CONFIG_DIR));

    dirs
}

/// Find the first existing `gateway.toml` among `dirs`.
pub fn locate_config(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[listener]\nmax_connections = 0\n").unwrap();

        match load_config(&path) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::ZeroMaxConnections]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn load_reports_syntax_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[gateway\nport = 1").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn save_then_load_keeps_port() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = GatewayConfig::default();
        config.gateway.port = Some(8088);
        save_config(&path, &config).unwrap();

        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn save_replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[gateway]\nport = 81\n").unwrap();

        let mut config = load_config(&path).unwrap();
        config.gateway.port = Some(82);
        save_config(&path, &config).unwrap();

        assert_eq!(load_config(&path).unwrap().gateway.port, Some(82));
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn validation_errors_are_all_reported() {
        let err = ConfigError::Validation(vec![
            ValidationError::ZeroHeaderTimeout,
            ValidationError::ZeroMaxConnections,
        ]);
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains(", "));
    }

    #[test]
    fn locate_prefers_earlier_directories() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join(CONFIG_FILE_NAME), "").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(
            locate_config(&dirs),
            Some(second.path().join(CONFIG_FILE_NAME))
        );

        fs::write(first.path().join(CONFIG_FILE_NAME), "").unwrap();
        assert_eq!(
            locate_config(&dirs),
            Some(first.path().join(CONFIG_FILE_NAME))
        );
    }
}
