//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use saga_orchestrator::config::ServiceConfig;
use saga_orchestrator::deps::{InMemoryCache, InMemoryDatabase};
use saga_orchestrator::domain::SagaRouter;
use saga_orchestrator::lifecycle::ListenState;
use saga_orchestrator::observability::PrometheusRegistry;
use saga_orchestrator::{Components, LifecycleController, LifecycleError, ServiceIdentity};
use tokio::task::JoinHandle;

/// A controller running in the background on a fixed local port.
pub struct RunningService {
    pub addr: SocketAddr,
    pub controller: Arc<LifecycleController>,
    pub database: Arc<InMemoryDatabase>,
    pub cache: Arc<InMemoryCache>,
    pub runner: JoinHandle<Result<(), LifecycleError>>,
}

impl RunningService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub fn config_on(addr: SocketAddr) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.host = addr.ip();
    config.listener.port = addr.port();
    config
}

pub fn controller_with(
    config: ServiceConfig,
    database: Arc<InMemoryDatabase>,
    cache: Arc<InMemoryCache>,
) -> Arc<LifecycleController> {
    let identity = ServiceIdentity::new(config.service.name.as_str());
    let metrics = PrometheusRegistry::install(&identity).unwrap();

    Arc::new(LifecycleController::new(
        config,
        Components {
            database,
            cache,
            metrics: Arc::new(metrics),
            domain: Arc::new(SagaRouter),
        },
    ))
}

/// Spawn `run` and wait until the controller is listening or has stopped.
pub async fn spawn_service(
    config: ServiceConfig,
    database: Arc<InMemoryDatabase>,
    cache: Arc<InMemoryCache>,
) -> RunningService {
    let addr = config.listener.bind_address();
    let controller = controller_with(config, database.clone(), cache.clone());
    let mut state = controller.watch_state();

    let runner = tokio::spawn({
        let controller = controller.clone();
        async move { controller.run().await }
    });

    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| matches!(s, ListenState::Listening | ListenState::Stopped)),
    )
    .await
    .expect("controller did not settle")
    .expect("state channel closed");

    RunningService {
        addr,
        controller,
        database,
        cache,
        runner,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
