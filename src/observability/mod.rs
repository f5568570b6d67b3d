//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via metrics)
//!
//! Consumers:
//!     → stdout or the configured log file
//!     → GET /v1/gateway/metrics on the management listener
//! ```
//!
//! # Design Decisions
//! - Structured fields, not formatted strings
//! - Request ID assigned at the gateway edge and forwarded upstream
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
