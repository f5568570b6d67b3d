//! Route store: the live, persisted routing table.
//!
//! # Responsibilities
//! - Load persisted routes at startup (missing/malformed file → empty)
//! - Validate and apply route registrations
//! - Persist the full target map after every mutation
//! - Serve lock-free lookups to the dispatcher
//!
//! # Design Decisions
//! - Readers load an `Arc<RouteTable>` snapshot through `ArcSwap`; they never
//!   block and never see a half-applied update
//! - Writers are serialized by a mutex, so file contents follow memory order
//! - Memory is updated before the write; a failed write is reported but not
//!   rolled back

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use thiserror::Error;
use url::Url;

use crate::http::proxy::{HttpClient, ReverseProxy};
use crate::routing::persist::{self, ROUTES_FILE};
use crate::routing::table::RouteTable;
use crate::routing::Route;

/// Errors from route registration.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The path is not usable as a prefix. Store unchanged.
    #[error("invalid route path {path:?}: must be non-empty and start with '/'")]
    InvalidPath { path: String },

    /// The target is not an absolute http(s) URL. Store unchanged.
    #[error("invalid target url {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    /// The route file could not be written. The in-memory update stands.
    #[error("failed to persist routes to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RouteError {
    /// True for errors caused by the request rather than the gateway.
    pub fn is_validation(&self) -> bool {
        !matches!(self, RouteError::Persistence { .. })
    }
}

/// Routing table shared by the dispatcher and the management API.
#[derive(Debug)]
pub struct RouteStore {
    file: PathBuf,
    client: HttpClient,
    table: ArcSwap<RouteTable>,
    writer: Mutex<()>,
}

impl RouteStore {
    /// Load the store from `file`.
    ///
    /// Never fails: an unreadable or malformed file yields an empty store,
    /// and persisted entries whose target is not a valid URL are skipped.
    pub fn load(file: impl Into<PathBuf>, client: HttpClient) -> Self {
        let file = file.into();

        let targets = match persist::load_routes(&file) {
            Ok(targets) => targets,
            Err(e) => {
                tracing::warn!(error = %e, "Starting with an empty route table");
                BTreeMap::new()
            }
        };

        let mut table = RouteTable::default();
        for (path, target) in targets {
            match validate_target(&target) {
                Ok(url) => {
                    let proxy = Arc::new(ReverseProxy::new(url, client.clone()));
                    table.insert(path, target, proxy);
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Skipping persisted route");
                }
            }
        }

        tracing::info!(
            routes = table.len(),
            file = %file.display(),
            "Route table loaded"
        );

        Self {
            file,
            client,
            table: ArcSwap::from_pointee(table),
            writer: Mutex::new(()),
        }
    }

    /// Load the store from `routes.json` inside the runtime directory.
    pub fn open_in(runtime_path: &Path, client: HttpClient) -> Self {
        Self::load(runtime_path.join(ROUTES_FILE), client)
    }

    /// Register `path → target`, replacing any existing target for `path`.
    pub fn create_or_update(&self, path: &str, target: &str) -> Result<(), RouteError> {
        validate_path(path)?;
        let url = validate_target(target)?;
        let proxy = Arc::new(ReverseProxy::new(url, self.client.clone()));

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = RouteTable::clone(&self.table.load());
        next.insert(path.to_string(), target.to_string(), proxy);
        let next = Arc::new(next);
        self.table.store(Arc::clone(&next));

        tracing::info!(path = %path, target = %target, "Route registered");

        persist::save_routes(&self.file, next.targets()).map_err(|source| {
            tracing::error!(
                file = %self.file.display(),
                error = %source,
                "Failed to persist routes; change kept in memory only"
            );
            RouteError::Persistence {
                path: self.file.clone(),
                source,
            }
        })
    }

    /// Snapshot of all routes, ordered by path.
    pub fn list(&self) -> Vec<Route> {
        self.table.load().routes()
    }

    /// Forwarder for the longest registered prefix of `request_path`.
    pub fn resolve(&self, request_path: &str) -> Option<Arc<ReverseProxy>> {
        self.table.load().resolve(request_path).cloned()
    }

    pub fn len(&self) -> usize {
        self.table.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.load().is_empty()
    }

    /// Path of the persisted route file.
    pub fn file(&self) -> &Path {
        &self.file
    }
}

fn validate_path(path: &str) -> Result<(), RouteError> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(RouteError::InvalidPath {
            path: path.to_string(),
        })
    }
}

fn validate_target(target: &str) -> Result<Url, RouteError> {
    let invalid = |reason: String| RouteError::InvalidTarget {
        target: target.to_string(),
        reason,
    };

    let url = Url::parse(target).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}
