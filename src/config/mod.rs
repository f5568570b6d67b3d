//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml (first hit in the search path)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig
//!     → runtime.rs (RuntimeState, shared via Arc)
//!
//! On PUT /v1/gateway/port:
//!     RuntimeState updates the port in memory
//!     → loader.rs writes the file back
//!     → new port used on the next start
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal or missing configs
//! - Validation separates syntactic (serde) from semantic checks
//! - No process-wide singleton; RuntimeState is passed explicitly

pub mod loader;
pub mod runtime;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use runtime::RuntimeState;
pub use schema::{GatewayConfig, ListenerConfig, LoggingConfig};
