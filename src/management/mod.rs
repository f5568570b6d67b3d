//! Management API served on the loopback-only listener.
//!
//! | Method | Path                  |
//! |--------|-----------------------|
//! | GET    | `/v1/gateway/routes`  |
//! | POST   | `/v1/gateway/routes`  |
//! | GET    | `/v1/gateway/port`    |
//! | PUT    | `/v1/gateway/port`    |
//! | GET    | `/v1/gateway/status`  |
//! | GET    | `/v1/gateway/metrics` |

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use self::handlers::*;
use crate::config::RuntimeState;
use crate::routing::RouteStore;

/// State shared by the management handlers.
#[derive(Clone)]
pub struct ManagementState {
    pub store: Arc<RouteStore>,
    pub runtime: Arc<RuntimeState>,
    pub metrics: Option<PrometheusHandle>,
}

pub fn management_router(state: ManagementState) -> Router {
    Router::new()
        .route("/v1/gateway/routes", get(list_routes).post(create_route))
        .route("/v1/gateway/port", get(get_port).put(set_port))
        .route("/v1/gateway/status", get(get_status))
        .route("/v1/gateway/metrics", get(get_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
