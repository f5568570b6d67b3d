//! Startup orchestration.
//!
//! # Responsibilities
//! - Check that the runtime directory is usable
//! - Record the process id for supervisors
//! - Load the persisted route table
//! - Run the gateway and management listeners as one supervised group
//!
//! # Design Decisions
//! - Fail fast: a bind or publish failure on either listener stops both
//! - Address files exist exactly while their listener accepts traffic
//! - routes.json survives shutdown; address files do not

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;

use crate::config::RuntimeState;
use crate::http::{build_client, gateway_router, HttpServer};
use crate::lifecycle::Shutdown;
use crate::management::{management_router, ManagementState};
use crate::net::address_file::{self, GATEWAY_URL_FILE, MANAGEMENT_URL_FILE};
use crate::net::{Listener, ListenerError};
use crate::routing::RouteStore;

pub const PID_FILE: &str = "gateway.pid";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("runtime directory {} is not usable: {source}", path.display())]
    RuntimeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write pid file {}: {source}", path.display())]
    PidFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Make sure the runtime directory exists and is a directory.
pub fn check_prerequisites(runtime_path: &Path) -> Result<(), StartupError> {
    let dir_error = |source| StartupError::RuntimeDir {
        path: runtime_path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(runtime_path).map_err(dir_error)?;
    let metadata = std::fs::metadata(runtime_path).map_err(dir_error)?;
    if !metadata.is_dir() {
        return Err(dir_error(io::Error::other("not a directory")));
    }
    Ok(())
}

/// `gateway.pid` in the runtime directory, removed when dropped.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn create(runtime_path: &Path) -> Result<Self, StartupError> {
        let path = runtime_path.join(PID_FILE);
        let pid = std::process::id().to_string();

        address_file::write_private(&path, pid.as_bytes()).map_err(|source| {
            StartupError::PidFile {
                path: path.clone(),
                source,
            }
        })?;

        tracing::debug!(file = %path.display(), pid = %pid, "Wrote pid file");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        address_file::remove(&self.path);
    }
}

/// The gateway process: route store plus its two listeners.
pub struct Gateway {
    runtime: Arc<RuntimeState>,
    store: Arc<RouteStore>,
    metrics: Option<PrometheusHandle>,
}

impl Gateway {
    /// Load `routes.json` from the runtime directory. Never fails; a bad
    /// file starts the gateway with no routes.
    pub fn new(runtime: Arc<RuntimeState>) -> Self {
        let store = Arc::new(RouteStore::open_in(runtime.runtime_path(), build_client()));
        Self {
            runtime,
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Serve until `shutdown` fires or either listener fails.
    ///
    /// A failing listener triggers `shutdown` so its sibling stops too. The
    /// error is returned once both have finished.
    pub async fn run(self, shutdown: Shutdown) -> Result<(), StartupError> {
        let config = self.runtime.config();
        let header_timeout = Duration::from_secs(config.listener.header_read_timeout_secs);
        let max_connections = config.listener.max_connections;
        let runtime_path = self.runtime.runtime_path();

        tracing::info!(
            runtime_path = %runtime_path.display(),
            routes = self.store.len(),
            routes_file = %self.store.file().display(),
            "Gateway starting"
        );

        let management = management_router(ManagementState {
            store: self.store.clone(),
            runtime: self.runtime.clone(),
            metrics: self.metrics.clone(),
        });
        let gateway = gateway_router(self.store.clone());

        let management_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
        let gateway_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.runtime.gateway_port()));

        let (management_result, gateway_result) = tokio::join!(
            supervise(
                Endpoint {
                    name: "management",
                    addr: management_addr,
                    address_file: MANAGEMENT_URL_FILE,
                    router: management,
                },
                runtime_path,
                header_timeout,
                max_connections,
                &shutdown,
            ),
            supervise(
                Endpoint {
                    name: "gateway",
                    addr: gateway_addr,
                    address_file: GATEWAY_URL_FILE,
                    router: gateway,
                },
                runtime_path,
                header_timeout,
                max_connections,
                &shutdown,
            ),
        );

        management_result?;
        gateway_result?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

struct Endpoint {
    name: &'static str,
    addr: SocketAddr,
    address_file: &'static str,
    router: Router,
}

async fn supervise(
    endpoint: Endpoint,
    runtime_path: &Path,
    header_timeout: Duration,
    max_connections: usize,
    shutdown: &Shutdown,
) -> Result<(), ListenerError> {
    let name = endpoint.name;
    let result = serve(endpoint, runtime_path, header_timeout, max_connections, shutdown).await;
    if let Err(e) = &result {
        tracing::error!(server = name, error = %e, "Listener failed, stopping gateway");
        shutdown.trigger();
    }
    result
}

async fn serve(
    endpoint: Endpoint,
    runtime_path: &Path,
    header_timeout: Duration,
    max_connections: usize,
    shutdown: &Shutdown,
) -> Result<(), ListenerError> {
    let listener = Listener::bind(endpoint.addr, max_connections).await?;
    let url = listener.url();
    let published = address_file::publish(runtime_path, endpoint.address_file, &url)?;

    tracing::info!(server = endpoint.name, url = %url, file = %published.display(), "Listening");

    HttpServer::new(endpoint.name, endpoint.router, header_timeout)
        .run(listener, shutdown.subscribe())
        .await;

    address_file::remove(&published);
    Ok(())
}
