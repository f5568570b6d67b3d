//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Requested address (0.0.0.0:<port> or 127.0.0.1:0)
//!     → listener.rs (bind, connection limits)
//!     → address_file.rs (publish reachable URL to the runtime dir)
//!     → connection.rs (lifecycle tracking for drain)
//!     → Hand off to HTTP layer
//!
//! Server States:
//!     Unbound → Bound & Published → Serving → Stopped
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Bind or publish failure is terminal; no retry state

pub mod address_file;
pub mod connection;
pub mod listener;

pub use listener::{Listener, ListenerError};
