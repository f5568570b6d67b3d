//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::Listener)
//!     → server.rs (hyper-util auto builder, header read timeout)
//!     → dispatch.rs (gateway) or management (control plane)
//!     → routing::RouteStore::resolve (longest prefix)
//!     → proxy.rs (ReverseProxy for that route)
//!         → request.rs (rewrite URI, strip hop-by-hop, X-Forwarded-*)
//!         → upstream
//!         → response.rs (strip hop-by-hop, stream body back)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::gateway_router;
pub use proxy::{build_client, HttpClient, ProxyError, ReverseProxy};
pub use server::HttpServer;
