//! Dynamic path-prefix HTTP gateway.
//!
//! Requests on the gateway listener are forwarded to the backend whose
//! registered path prefix is the longest match. Routes are managed over a
//! loopback-only HTTP API and persisted to `routes.json` in the runtime
//! directory, next to the `gateway.url` and `management.url` address files.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod management;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use config::RuntimeState;
pub use http::HttpServer;
pub use lifecycle::{Gateway, Shutdown};
pub use routing::{Route, RouteStore};
