use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinError;

use crate::config::ConfigError;
use crate::management::ManagementState;
use crate::observability::metrics;
use crate::routing::{Route, RouteError};

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub routes: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayPort {
    pub port: u16,
}

/// Reply to a port change. The running listener keeps its port.
#[derive(Debug, Serialize, Deserialize)]
pub struct PortUpdate {
    pub port: u16,
    pub restart_required: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Errors returned by management handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("port must be between 1 and 65535")]
    InvalidPort,

    #[error("port updated in memory but not saved: {0}")]
    Config(#[from] ConfigError),

    #[error("update task failed: {0}")]
    Task(#[from] JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Route(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::InvalidPort => StatusCode::BAD_REQUEST,
            ApiError::Route(_) | ApiError::Config(_) | ApiError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub async fn get_status(State(state): State<ManagementState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        routes: state.store.len(),
    })
}

pub async fn list_routes(State(state): State<ManagementState>) -> Json<Vec<Route>> {
    Json(state.store.list())
}

pub async fn create_route(
    State(state): State<ManagementState>,
    Json(route): Json<Route>,
) -> Result<Json<Route>, ApiError> {
    // Writers take a mutex and fsync routes.json.
    let store = state.store.clone();
    let (path, target) = (route.path.clone(), route.target.clone());
    let outcome =
        tokio::task::spawn_blocking(move || store.create_or_update(&path, &target)).await?;

    match outcome {
        Ok(()) => {
            metrics::record_route_update("ok");
            Ok(Json(route))
        }
        Err(e) => {
            let result = if e.is_validation() { "invalid" } else { "persist_failed" };
            metrics::record_route_update(result);
            tracing::warn!(
                path = %route.path,
                target = %route.target,
                error = %e,
                "Route rejected"
            );
            Err(e.into())
        }
    }
}

pub async fn get_port(State(state): State<ManagementState>) -> Json<GatewayPort> {
    Json(GatewayPort {
        port: state.runtime.gateway_port(),
    })
}

pub async fn set_port(
    State(state): State<ManagementState>,
    Json(body): Json<GatewayPort>,
) -> Result<Json<PortUpdate>, ApiError> {
    if body.port == 0 {
        return Err(ApiError::InvalidPort);
    }

    let runtime = state.runtime.clone();
    let port = body.port;
    tokio::task::spawn_blocking(move || runtime.set_gateway_port(port)).await??;

    Ok(Json(PortUpdate {
        port: body.port,
        restart_required: true,
        message: "gateway port saved; it takes effect when the gateway restarts".to_string(),
    }))
}

pub async fn get_metrics(State(state): State<ManagementState>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
