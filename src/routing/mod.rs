//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     routes.json
//!     → persist.rs (load path → target map)
//!     → store.rs (validate targets, build forwarders)
//!     → table.rs (snapshot: target map + proxy cache)
//!
//! Incoming Request (path)
//!     → store.rs (load current snapshot)
//!     → table.rs + matcher.rs (longest matching prefix)
//!     → Return: forwarder or NoMatch
//!
//! Registration (management API):
//!     Route { path, target }
//!     → store.rs (validate, build new snapshot, swap, persist)
//! ```
//!
//! # Design Decisions
//! - Routes are mutable at runtime through the management API only
//! - No regex in hot path (prefix matching only)
//! - Deterministic: longest matching prefix wins
//! - Explicit NoMatch rather than silent default

pub mod matcher;
pub mod persist;
pub mod store;
pub mod table;

use serde::{Deserialize, Serialize};

pub use persist::ROUTES_FILE;
pub use store::{RouteError, RouteStore};
pub use table::RouteTable;

/// A path prefix and the base URL its traffic is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub target: String,
}
