//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    http::{HeaderMap, Method, Uri},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use route_gateway::config::{GatewayConfig, RuntimeState};
use route_gateway::lifecycle::{Gateway, Shutdown, StartupError};
use route_gateway::net::address_file::{self, GATEWAY_URL_FILE, MANAGEMENT_URL_FILE};

/// Start a backend that echoes the request it received as JSON.
pub async fn start_echo_backend(name: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: String| async move {
            let header = |key: &str| {
                headers
                    .get(key)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            Json(json!({
                "backend": name,
                "method": method.as_str(),
                "uri": uri.to_string(),
                "host": header("host"),
                "forwarded_for": header("x-forwarded-for"),
                "forwarded_host": header("x-forwarded-host"),
                "body": body,
            }))
        },
    );

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a backend whose `/ws/echo` endpoint echoes websocket messages.
pub async fn start_ws_echo_backend() -> SocketAddr {
    async fn echo(mut socket: WebSocket) {
        while let Some(Ok(message)) = socket.recv().await {
            if matches!(message, Message::Close(_)) || socket.send(message).await.is_err() {
                break;
            }
        }
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route(
        "/ws/echo",
        get(|ws: WebSocketUpgrade| async move { ws.on_upgrade(echo) }),
    );

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a backend that answers "done" after `delay`.
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "done"
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// A gateway running in the background of a test.
pub struct TestGateway {
    pub runtime_path: PathBuf,
    pub gateway_url: String,
    pub management_url: String,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), StartupError>>,
}

impl TestGateway {
    pub async fn stop(self) -> Result<(), StartupError> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .expect("gateway did not stop")
            .unwrap()
    }
}

pub fn test_config(runtime_path: &Path, port: u16) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.gateway.port = Some(port);
    config.common.runtime_path = runtime_path.to_path_buf();
    config
}

/// Spawn a gateway with `config` and wait for both address files.
pub fn spawn_gateway(config: GatewayConfig) -> (Shutdown, JoinHandle<Result<(), StartupError>>) {
    let runtime = Arc::new(RuntimeState::new(config, None));
    let shutdown = Shutdown::new();
    let gateway = Gateway::new(runtime);
    let task = tokio::spawn(gateway.run(shutdown.clone()));
    (shutdown, task)
}

pub async fn start_gateway(runtime_path: &Path) -> TestGateway {
    let (shutdown, task) = spawn_gateway(test_config(runtime_path, 0));

    let gateway_url = wait_for_address(runtime_path, GATEWAY_URL_FILE).await;
    let management_url = wait_for_address(runtime_path, MANAGEMENT_URL_FILE).await;

    TestGateway {
        runtime_path: runtime_path.to_path_buf(),
        gateway_url,
        management_url,
        shutdown,
        task,
    }
}

pub async fn wait_for_address(runtime_path: &Path, file: &str) -> String {
    for _ in 0..200 {
        if let Ok(url) = address_file::read(runtime_path, file) {
            if !url.is_empty() {
                return url;
            }
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("{file} was never published in {}", runtime_path.display());
}

pub async fn add_route(
    client: &reqwest::Client,
    management_url: &str,
    path: &str,
    target: &str,
) -> reqwest::StatusCode {
    client
        .post(format!("{management_url}/v1/gateway/routes"))
        .json(&json!({ "path": path, "target": target }))
        .send()
        .await
        .unwrap()
        .status()
}

pub async fn json_body(res: reqwest::Response) -> Value {
    res.json().await.unwrap()
}
