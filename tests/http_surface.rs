//! HTTP surface tests against a running service.

use std::net::SocketAddr;
use std::sync::Arc;

use saga_orchestrator::deps::{InMemoryCache, InMemoryDatabase};
use saga_orchestrator::lifecycle::ShutdownReason;
use saga_orchestrator::observability::metrics::PROMETHEUS_CONTENT_TYPE;
use serde_json::Value;

mod common;

#[tokio::test]
async fn test_health_follows_dependencies() {
    let addr: SocketAddr = "127.0.0.1:28461".parse().unwrap();
    let service = common::spawn_service(
        common::config_on(addr),
        Arc::new(InMemoryDatabase::new()),
        Arc::new(InMemoryCache::new()),
    )
    .await;
    let client = common::client();

    let res = client.get(service.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "saga-orchestrator-service");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["redis"], "connected");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));

    service.database.set_reachable(false);
    let res = client.get(service.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["error"], "Database connection failed");
    assert!(body.get("database").is_none());

    service.database.set_reachable(true);
    let res = client.get(service.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    service.controller.shutdown_handle().trigger(ShutdownReason::Terminate);
    assert!(service.runner.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_degraded_cache_still_serves() {
    let addr: SocketAddr = "127.0.0.1:28462".parse().unwrap();
    let service = common::spawn_service(
        common::config_on(addr),
        Arc::new(InMemoryDatabase::new()),
        Arc::new(InMemoryCache::unreachable()),
    )
    .await;

    let res = common::client().get(service.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["database"], "connected");
    assert_eq!(body["redis"], "disconnected");

    service.controller.shutdown_handle().trigger(ShutdownReason::Terminate);
    assert!(service.runner.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_unknown_paths_are_not_found() {
    let addr: SocketAddr = "127.0.0.1:28463".parse().unwrap();
    let service = common::spawn_service(
        common::config_on(addr),
        Arc::new(InMemoryDatabase::new()),
        Arc::new(InMemoryCache::new()),
    )
    .await;
    let client = common::client();

    for path in ["/", "/healthz", "/api", "/api/unknown", "/metrics/extra"] {
        let res = client.get(service.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 404, "GET {path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, serde_json::json!({"error": "Not found"}));
    }

    let res = client.post(service.url("/nowhere")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    for path in ["/health", "/metrics", "/api/sagas"] {
        let res = client.post(service.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 404, "POST {path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, serde_json::json!({"error": "Not found"}));
    }

    service.controller.shutdown_handle().trigger(ShutdownReason::Terminate);
    assert!(service.runner.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_domain_and_metrics_endpoints() {
    let addr: SocketAddr = "127.0.0.1:28464".parse().unwrap();
    let service = common::spawn_service(
        common::config_on(addr),
        Arc::new(InMemoryDatabase::new()),
        Arc::new(InMemoryCache::new()),
    )
    .await;
    let client = common::client();

    let res = client.get(service.url("/api/sagas")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Saga orchestrator service is running");
    assert_eq!(body["version"], "1.0.0");

    let res = client.get(service.url("/metrics")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["content-type"].to_str().unwrap(),
        PROMETHEUS_CONTENT_TYPE
    );
    let text = res.text().await.unwrap();
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("service=\"saga-orchestrator-service\""));

    service.controller.shutdown_handle().trigger(ShutdownReason::Terminate);
    assert!(service.runner.await.unwrap().is_ok());
}
