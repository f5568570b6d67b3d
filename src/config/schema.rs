//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for (de)serialization from `gateway.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Port the gateway listener falls back to when none is configured.
pub const DEFAULT_GATEWAY_PORT: u16 = 80;

/// Root configuration for the gateway process.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway listener settings.
    pub gateway: GatewaySection,

    /// Settings shared with sibling services (runtime directory).
    pub common: CommonConfig,

    /// Accept loop and connection settings, applied to both listeners.
    pub listener: ListenerConfig,

    /// Log level and destination.
    pub logging: LoggingConfig,
}

/// Gateway listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewaySection {
    /// Public listening port. `None` means "fall back to 80 on first use".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Settings shared across processes.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CommonConfig {
    /// Directory holding address files, the pid file and `routes.json`.
    pub runtime_path: PathBuf,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            runtime_path: PathBuf::from("/var/run/route-gateway"),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Time allowed for a client to send the request head, in seconds.
    pub header_read_timeout_secs: u64,

    /// Maximum concurrent connections per listener (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            header_read_timeout_secs: 5,
            max_connections: 10_000,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Directory for the log file. Logs go to stdout when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Log file base name.
    pub save_name: String,

    /// Log file extension.
    pub file_ext: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            path: None,
            save_name: "gateway".to_string(),
            file_ext: "log".to_string(),
        }
    }
}
