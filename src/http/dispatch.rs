//! Gateway dispatcher.
//!
//! Every inbound request on the gateway listener is matched against the
//! route store and forwarded, or answered with an empty 404.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::http::response;
use crate::observability::metrics;
use crate::routing::RouteStore;

/// Build the router served on the gateway listener.
pub fn gateway_router(store: Arc<RouteStore>) -> Router {
    Router::new()
        .route("/{*path}", any(dispatch))
        .route("/", any(dispatch))
        .with_state(store)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Looks up the route for the request path and forwards the request.
async fn dispatch(State(store): State<Arc<RouteStore>>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let Some(proxy) = store.resolve(&path) else {
        tracing::debug!(method = %method, path = %path, "No route matched");
        metrics::record_request(&method, StatusCode::NOT_FOUND, false, start_time);
        return response::not_found();
    };

    tracing::debug!(
        method = %method,
        path = %path,
        target = %proxy.target(),
        "Proxying request"
    );

    match proxy.forward(request, client_addr).await {
        Ok(response) => {
            metrics::record_request(&method, response.status(), true, start_time);
            response
        }
        Err(e) => {
            tracing::error!(
                method = %method,
                path = %path,
                target = %proxy.target(),
                error = %e,
                "Upstream error"
            );
            metrics::record_request(&method, StatusCode::BAD_GATEWAY, true, start_time);
            response::bad_gateway()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::proxy::build_client;
    use tower::ServiceExt;

    #[tokio::test]
    async fn unmatched_path_is_empty_404() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RouteStore::open_in(dir.path(), build_client()));
        store.create_or_update("/api", "http://127.0.0.1:9").unwrap();

        let response = gateway_router(store)
            .oneshot(Request::get("/other").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn unreachable_backend_is_502() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RouteStore::open_in(dir.path(), build_client()));

        // Bind and drop to get a port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        store
            .create_or_update("/", &format!("http://127.0.0.1:{port}"))
            .unwrap();

        let response = gateway_router(store)
            .oneshot(Request::get("/anything").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
