//! Process-wide runtime state.
//!
//! Holds the runtime directory (fixed at startup) and the effective gateway
//! port. Owned by the process and shared by `Arc`; the management API is the
//! only writer of the port.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::loader::{save_config, ConfigError};
use crate::config::schema::{GatewayConfig, DEFAULT_GATEWAY_PORT};

/// Runtime directory plus the mutable part of the configuration.
#[derive(Debug)]
pub struct RuntimeState {
    runtime_path: PathBuf,
    config: Mutex<GatewayConfig>,
    /// File the config was loaded from; port changes are written back here.
    config_path: Option<PathBuf>,
}

impl RuntimeState {
    /// Create runtime state from a loaded configuration.
    pub fn new(config: GatewayConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            runtime_path: config.common.runtime_path.clone(),
            config: Mutex::new(config),
            config_path,
        }
    }

    /// Directory holding address files, the pid file and persisted routes.
    pub fn runtime_path(&self) -> &Path {
        &self.runtime_path
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> GatewayConfig {
        self.lock().clone()
    }

    /// Effective gateway port.
    ///
    /// An unset port is pinned to the fallback on first use, so later reads
    /// agree with the port the listener was bound on.
    pub fn gateway_port(&self) -> u16 {
        *self
            .lock()
            .gateway
            .port
            .get_or_insert(DEFAULT_GATEWAY_PORT)
    }

    /// Write the fallback port to the config file when none is configured.
    ///
    /// Called once at startup so a restart binds the same port even after
    /// the fallback changes. Returns the effective port.
    pub fn pin_gateway_port(&self) -> Result<u16, ConfigError> {
        let mut config = self.lock();
        if let Some(port) = config.gateway.port {
            return Ok(port);
        }

        config.gateway.port = Some(DEFAULT_GATEWAY_PORT);
        if let Some(path) = &self.config_path {
            save_config(path, &config)?;
            tracing::info!(
                port = DEFAULT_GATEWAY_PORT,
                file = %path.display(),
                "Pinned fallback gateway port"
            );
        }
        Ok(DEFAULT_GATEWAY_PORT)
    }

    /// Record a new gateway port.
    ///
    /// Takes effect on the next gateway bind (the next process start); an
    /// already bound listener is not migrated. When the process was started
    /// from a config file the new port is written back to it while the lock
    /// is held, so the file always ends with the last port set. The in-memory
    /// value is kept even if that write fails.
    ///
    /// Blocks on file IO; async callers should move it off the runtime.
    pub fn set_gateway_port(&self, port: u16) -> Result<(), ConfigError> {
        let mut config = self.lock();
        config.gateway.port = Some(port);

        tracing::info!(port, "Gateway port updated, effective on next start");

        match &self.config_path {
            Some(path) => save_config(path, &config),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GatewayConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
