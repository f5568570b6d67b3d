//! Failure injection tests for the gateway.

use std::time::Duration;

use reqwest::StatusCode;
use tokio::net::TcpListener;

use route_gateway::lifecycle::StartupError;
use route_gateway::net::address_file::{GATEWAY_URL_FILE, MANAGEMENT_URL_FILE};
use route_gateway::net::ListenerError;
use route_gateway::routing::ROUTES_FILE;

mod common;

#[tokio::test]
async fn test_backend_down_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let dead = common::closed_port().await;
    let gw = common::start_gateway(dir.path()).await;
    let client = common::http_client();

    common::add_route(&client, &gw.management_url, "/dead", &format!("http://{dead}")).await;

    let res = client.get(format!("{}/dead/end", gw.gateway_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    gw.stop().await.unwrap();
}

#[tokio::test]
async fn test_gateway_port_in_use_stops_management_too() {
    let dir = tempfile::tempdir().unwrap();
    let occupied = TcpListener::bind("0.0.0.0:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();

    let (_shutdown, task) = common::spawn_gateway(common::test_config(dir.path(), port));

    let result = tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("gateway should exit when its port is taken")
        .unwrap();

    assert!(matches!(
        result,
        Err(StartupError::Listener(ListenerError::Bind { .. }))
    ));
    assert!(!dir.path().join(MANAGEMENT_URL_FILE).exists());
    assert!(!dir.path().join(GATEWAY_URL_FILE).exists());
}

#[tokio::test]
async fn test_concurrent_registrations_are_all_kept() {
    let dir = tempfile::tempdir().unwrap();
    let gw = common::start_gateway(dir.path()).await;
    let client = common::http_client();

    let mut tasks = Vec::new();
    for i in 0..20 {
        let client = client.clone();
        let url = gw.management_url.clone();
        tasks.push(tokio::spawn(async move {
            let target = format!("http://127.0.0.1:{}", 9000 + i);
            common::add_route(&client, &url, &format!("/svc{i}"), &target).await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let routes = common::json_body(
        client.get(format!("{}/v1/gateway/routes", gw.management_url)).send().await.unwrap(),
    )
    .await;
    assert_eq!(routes.as_array().unwrap().len(), 20);

    let saved = std::fs::read_to_string(dir.path().join(ROUTES_FILE)).unwrap();
    let persisted: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(persisted.as_object().unwrap().len(), 20);

    gw.stop().await.unwrap();
}

#[tokio::test]
async fn test_corrupt_routes_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(ROUTES_FILE), b"{ not json").unwrap();

    let gw = common::start_gateway(dir.path()).await;
    let client = common::http_client();

    let routes = common::json_body(
        client.get(format!("{}/v1/gateway/routes", gw.management_url)).send().await.unwrap(),
    )
    .await;
    assert_eq!(routes, serde_json::json!([]));

    gw.stop().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_drains_in_flight_request_and_refuses_new_connections() {
    let dir = tempfile::tempdir().unwrap();
    let backend = common::start_slow_backend(Duration::from_millis(500)).await;
    let gw = common::start_gateway(dir.path()).await;
    let client = common::http_client();

    common::add_route(&client, &gw.management_url, "/slow", &format!("http://{backend}")).await;

    let in_flight = {
        let url = format!("{}/slow/job", gw.gateway_url);
        let client = client.clone();
        tokio::spawn(async move { client.get(url).send().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    gw.shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let gateway_addr = gw.gateway_url.trim_start_matches("http://").to_string();
    assert!(tokio::net::TcpStream::connect(&gateway_addr).await.is_err());

    let res = in_flight.await.unwrap().unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "done");

    let result = tokio::time::timeout(Duration::from_secs(10), gw.task)
        .await
        .expect("gateway should stop once the request drained")
        .unwrap();
    assert!(result.is_ok());
    assert!(!dir.path().join(GATEWAY_URL_FILE).exists());
}
