//! Route table snapshot.
//!
//! # Responsibilities
//! - Hold the persisted `path → target` map
//! - Hold the derived proxy cache (one forwarder per path)
//! - Look up the forwarder for a request path
//!
//! # Design Decisions
//! - Both maps live in one value, so a published snapshot is always consistent
//! - Proxy cache kept ordered longest prefix first: first match wins and is
//!   the most specific one
//! - Snapshots are immutable once published; writers clone and replace

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::http::proxy::ReverseProxy;
use crate::routing::matcher::PathPrefixMatcher;
use crate::routing::Route;

/// Target map plus the proxy cache derived from it.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    targets: BTreeMap<String, String>,
    proxies: Vec<(PathPrefixMatcher, Arc<ReverseProxy>)>,
}

impl RouteTable {
    /// Insert or replace the route for `path`, keeping both maps in step.
    pub fn insert(&mut self, path: String, target: String, proxy: Arc<ReverseProxy>) {
        self.proxies.retain(|(matcher, _)| matcher.prefix() != path);
        self.proxies.push((PathPrefixMatcher::new(path.clone()), proxy));
        self.proxies.sort_by(|(a, _), (b, _)| {
            b.specificity()
                .cmp(&a.specificity())
                .then_with(|| a.prefix().cmp(b.prefix()))
        });
        self.targets.insert(path, target);
    }

    /// Forwarder for the longest registered prefix of `request_path`.
    pub fn resolve(&self, request_path: &str) -> Option<&Arc<ReverseProxy>> {
        self.proxies
            .iter()
            .find(|(matcher, _)| matcher.matches(request_path))
            .map(|(_, proxy)| proxy)
    }

    /// The persisted form of the table.
    pub fn targets(&self) -> &BTreeMap<String, String> {
        &self.targets
    }

    pub fn routes(&self) -> Vec<Route> {
        self.targets
            .iter()
            .map(|(path, target)| Route {
                path: path.clone(),
                target: target.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
