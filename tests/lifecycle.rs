//! End-to-end lifecycle tests: startup, shutdown and the listening port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use saga_orchestrator::config::loader::apply_env_overrides;
use saga_orchestrator::config::ServiceConfig;
use saga_orchestrator::deps::{InMemoryCache, InMemoryDatabase, Journal};
use saga_orchestrator::lifecycle::{ListenState, ShutdownReason};
use saga_orchestrator::LifecycleError;
use tokio::net::TcpStream;

mod common;

#[tokio::test]
async fn test_port_from_environment_is_bound() {
    let mut config = ServiceConfig::default();
    config.listener.host = "127.0.0.1".parse().unwrap();
    apply_env_overrides(&mut config, |key| (key == "PORT").then(|| "28451".to_string())).unwrap();

    let service = common::spawn_service(
        config,
        Arc::new(InMemoryDatabase::new()),
        Arc::new(InMemoryCache::new()),
    )
    .await;

    assert_eq!(service.controller.state(), ListenState::Listening);
    assert_eq!(service.controller.local_addr().map(|a| a.port()), Some(28451));
    assert!(TcpStream::connect(service.addr).await.is_ok());

    service.controller.shutdown_handle().trigger(ShutdownReason::Terminate);
    assert!(service.runner.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_database_failure_exits_without_listening() {
    let addr: SocketAddr = "127.0.0.1:28452".parse().unwrap();
    let service = common::spawn_service(
        common::config_on(addr),
        Arc::new(InMemoryDatabase::unreachable()),
        Arc::new(InMemoryCache::new()),
    )
    .await;

    let result = service.runner.await.unwrap();
    assert!(matches!(
        result,
        Err(LifecycleError::MandatoryDependency { dependency: "database", .. })
    ));
    assert_eq!(service.controller.state(), ListenState::Stopped);
    assert!(service.controller.local_addr().is_none());
    assert!(TcpStream::connect(addr).await.is_err(), "port must stay unbound");
}

#[tokio::test]
async fn test_shutdown_releases_dependencies_once_in_order() {
    let addr: SocketAddr = "127.0.0.1:28453".parse().unwrap();
    let journal = Journal::new();
    let database = Arc::new(InMemoryDatabase::new().with_journal(journal.clone()));
    let cache = Arc::new(InMemoryCache::new().with_journal(journal.clone()));

    let service = common::spawn_service(common::config_on(addr), database, cache).await;
    assert_eq!(service.controller.state(), ListenState::Listening);

    let shutdown = service.controller.shutdown_handle();
    shutdown.trigger(ShutdownReason::Terminate);
    shutdown.trigger(ShutdownReason::Interrupt);

    let result = tokio::time::timeout(Duration::from_secs(5), service.runner)
        .await
        .expect("shutdown did not complete")
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(service.controller.state(), ListenState::Stopped);
    assert_eq!(service.database.disconnect_count(), 1);
    assert_eq!(service.cache.disconnect_count(), 1);
    assert_eq!(
        journal.events(),
        vec![
            "cache.connect",
            "database.connect",
            "database.disconnect",
            "cache.disconnect"
        ]
    );

    // A late programmatic request is a no-op.
    assert!(!service.controller.shutdown(ShutdownReason::Requested).await);
    assert_eq!(service.database.disconnect_count(), 1);
}

#[tokio::test]
async fn test_disconnect_errors_keep_clean_exit() {
    let addr: SocketAddr = "127.0.0.1:28454".parse().unwrap();
    let database = Arc::new(InMemoryDatabase::new());
    let cache = Arc::new(InMemoryCache::new());
    database.fail_disconnect(true);
    cache.fail_disconnect(true);

    let service = common::spawn_service(common::config_on(addr), database, cache).await;
    service.controller.shutdown_handle().trigger(ShutdownReason::Interrupt);

    assert!(service.runner.await.unwrap().is_ok());
    assert_eq!(service.cache.disconnect_count(), 1);
}
