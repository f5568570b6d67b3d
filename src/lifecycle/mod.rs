//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Check runtime dir → Write pid file → Pin port → Load routes → Start listeners
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain connections → Remove address files
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then routes, then listeners
//! - One shutdown handle is shared by both listeners

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{Gateway, StartupError};
