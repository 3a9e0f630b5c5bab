//! Lifecycle controller: startup, serving and shutdown.
//!
//! # Startup order
//! telemetry (system sampler) → cache (optional) → database (mandatory) →
//! bind listener. The cache attempt fully resolves before the database
//! attempt begins.
//!
//! # Failure policy
//! - Cache unreachable: logged, the service runs without caching
//! - Database unreachable: logged, startup aborts, the process exits non-zero
//! - Disconnect failures during shutdown: logged, never change the exit path

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::ServiceConfig;
use crate::deps::{CacheHandle, DatabaseHandle, DependencyError};
use crate::domain::DomainRouter;
use crate::health::HealthAggregator;
use crate::http::{build_router, AppState};
use crate::identity::ServiceIdentity;
use crate::lifecycle::shutdown::{recv_reason, Shutdown, ShutdownReason};
use crate::lifecycle::state::ListenState;
use crate::observability::metrics::{self, MetricsExporter};
use crate::observability::SystemSampler;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("controller already started (state: {0})")]
    AlreadyStarted(ListenState),

    #[error("startup interrupted by shutdown (state: {0})")]
    Interrupted(ListenState),

    #[error("mandatory dependency `{dependency}` unavailable: {source}")]
    MandatoryDependency {
        dependency: &'static str,
        #[source]
        source: DependencyError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Collaborators the controller drives. Constructed once by the caller.
pub struct Components {
    pub database: Arc<dyn DatabaseHandle>,
    pub cache: Arc<dyn CacheHandle>,
    pub metrics: Arc<dyn MetricsExporter>,
    pub domain: Arc<dyn DomainRouter>,
}

pub struct LifecycleController {
    config: ServiceConfig,
    identity: ServiceIdentity,
    components: Components,
    health: Arc<HealthAggregator>,
    state: watch::Sender<ListenState>,
    shutdown: Shutdown,
    local_addr: OnceLock<SocketAddr>,
}

impl LifecycleController {
    pub fn new(config: ServiceConfig, components: Components) -> Self {
        let identity = ServiceIdentity::new(config.service.name.as_str());
        let health = Arc::new(HealthAggregator::new(
            identity.clone(),
            components.database.clone(),
            components.cache.clone(),
        ));
        let (state, _) = watch::channel(ListenState::NotStarted);

        Self {
            config,
            identity,
            components,
            health,
            state,
            shutdown: Shutdown::new(),
            local_addr: OnceLock::new(),
        }
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    pub fn state(&self) -> ListenState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ListenState> {
        self.state.subscribe()
    }

    /// Trigger for the shutdown channel `run` waits on.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Address the listener is bound to, once startup bound it.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Move to `to` if `allowed` accepts the current state. Returns the
    /// previous state, or the current one when the transition was refused.
    fn transition(
        &self,
        to: ListenState,
        allowed: impl Fn(ListenState) -> bool,
    ) -> Result<ListenState, ListenState> {
        let mut from = ListenState::NotStarted;
        let changed = self.state.send_if_modified(|current| {
            from = *current;
            if allowed(*current) {
                *current = to;
                true
            } else {
                false
            }
        });

        if changed {
            tracing::debug!(from = %from, to = %to, "Lifecycle transition");
            metrics::record_lifecycle_transition(to.as_str());
            Ok(from)
        } else {
            Err(from)
        }
    }

    fn abort(&self) {
        if self
            .transition(ListenState::Stopped, |s| s == ListenState::Initializing)
            .is_ok()
        {
            // Background tasks spawned during startup stop with it.
            self.shutdown.trigger(ShutdownReason::StartupFailed);
        }
    }

    /// Connect the dependencies and bind the listener.
    ///
    /// On success the controller is `Listening` and the bound listener is
    /// returned. A database failure moves it to `Stopped` instead.
    pub async fn start(&self) -> Result<TcpListener, LifecycleError> {
        self.transition(ListenState::Initializing, |s| s == ListenState::NotStarted)
            .map_err(LifecycleError::AlreadyStarted)?;

        tracing::info!(service = %self.identity, "Initializing services");

        let sampler = SystemSampler::new(
            self.config.observability.system_metrics_interval(),
            self.components.metrics.clone(),
        );
        tokio::spawn(sampler.run(self.shutdown.subscribe()));

        let cache = &self.components.cache;
        match cache.connect().await {
            Ok(()) => tracing::info!(dependency = cache.name(), "Redis connected successfully"),
            Err(e) => {
                tracing::error!(dependency = cache.name(), error = %e, "Failed to connect to Redis");
                tracing::warn!("Service will operate without caching");
            }
        }

        let database = &self.components.database;
        if let Err(e) = database.ensure_connection().await {
            tracing::error!(dependency = database.name(), error = %e, "Failed to connect to database");
            self.abort();
            return Err(LifecycleError::MandatoryDependency {
                dependency: database.name(),
                source: e,
            });
        }
        tracing::info!(dependency = database.name(), "Database connected successfully");

        let addr = self.config.listener.bind_address();
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(source) => {
                tracing::error!(address = %addr, error = %source, "Failed to bind listener");
                self.abort();
                return Err(LifecycleError::Bind { addr, source });
            }
        };
        let local_addr = listener.local_addr().unwrap_or(addr);

        self.transition(ListenState::Listening, |s| s == ListenState::Initializing)
            .map_err(LifecycleError::Interrupted)?;
        let _ = self.local_addr.set(local_addr);

        tracing::info!(
            address = %local_addr,
            "Saga Orchestrator Service running on port {}",
            local_addr.port()
        );
        Ok(listener)
    }

    /// Run the shutdown sequence once.
    ///
    /// Returns `false` without doing anything when a shutdown already ran or
    /// is running.
    pub async fn shutdown(&self, reason: ShutdownReason) -> bool {
        if self
            .transition(ListenState::ShuttingDown, ListenState::accepts_shutdown)
            .is_err()
        {
            tracing::debug!(reason = %reason, "Shutdown already in progress, ignoring");
            return false;
        }

        tracing::info!(reason = %reason, "Shutting down gracefully");
        // Stops background tasks; `run` ignores the echo.
        self.shutdown.trigger(reason);

        let database = &self.components.database;
        if let Err(e) = database.disconnect().await {
            tracing::error!(dependency = database.name(), error = %e, "Error disconnecting database");
        }

        let cache = &self.components.cache;
        if let Err(e) = cache.disconnect().await {
            tracing::error!(dependency = cache.name(), error = %e, "Error disconnecting Redis");
        }

        let _ = self.transition(ListenState::Stopped, |s| s == ListenState::ShuttingDown);
        tracing::info!("Shutdown sequence complete");
        true
    }

    async fn wait_until_stopped(&self) {
        let mut state = self.state.subscribe();
        let _ = state.wait_for(|s| *s == ListenState::Stopped).await;
    }

    /// Start, serve until a shutdown request arrives, then shut down.
    ///
    /// `Ok` means the service stopped gracefully (exit code 0). In-flight
    /// requests are not drained: dependencies are released while they may
    /// still be running.
    pub async fn run(&self) -> Result<(), LifecycleError> {
        let mut shutdown_rx = self.shutdown.subscribe();

        let listener = tokio::select! {
            started = self.start() => match started {
                Ok(listener) => listener,
                Err(LifecycleError::Interrupted(_)) => {
                    self.wait_until_stopped().await;
                    return Ok(());
                }
                Err(e) => return Err(e),
            },
            reason = recv_reason(&mut shutdown_rx) => {
                self.shutdown(reason).await;
                self.wait_until_stopped().await;
                return Ok(());
            }
        };

        let state = AppState {
            identity: self.identity.clone(),
            health: self.health.clone(),
            metrics: self.components.metrics.clone(),
        };
        let app = build_router(state, self.components.domain.as_ref(), &self.config);

        let (reason, server_error) = tokio::select! {
            result = axum::serve(listener, app.into_make_service()).into_future() => {
                let error = result.err();
                tracing::error!(error = ?error, "HTTP server stopped unexpectedly");
                (ShutdownReason::ServerStopped, error)
            }
            reason = recv_reason(&mut shutdown_rx) => (reason, None),
        };

        self.shutdown(reason).await;
        self.wait_until_stopped().await;

        match server_error {
            Some(e) => Err(LifecycleError::Serve(e)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::{InMemoryCache, InMemoryDatabase, Journal};
    use crate::domain::SagaRouter;
    use crate::observability::MetricsError;
    use std::net::{IpAddr, Ipv4Addr};

    struct NoMetrics;

    impl MetricsExporter for NoMetrics {
        fn content_type(&self) -> &'static str {
            "text/plain"
        }

        fn render(&self) -> Result<String, MetricsError> {
            Ok(String::new())
        }
    }

    fn ephemeral_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.listener.host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.listener.port = 0;
        config
    }

    fn controller(db: Arc<InMemoryDatabase>, cache: Arc<InMemoryCache>) -> LifecycleController {
        LifecycleController::new(
            ephemeral_config(),
            Components {
                database: db,
                cache,
                metrics: Arc::new(NoMetrics),
                domain: Arc::new(SagaRouter),
            },
        )
    }

    #[tokio::test]
    async fn test_database_failure_aborts_startup() {
        let db = Arc::new(InMemoryDatabase::unreachable());
        let cache = Arc::new(InMemoryCache::new());
        let controller = controller(db, cache);

        let err = controller.start().await.unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::MandatoryDependency { dependency: "database", .. }
        ));
        assert_eq!(controller.state(), ListenState::Stopped);
        assert!(controller.local_addr().is_none());
    }

    #[tokio::test]
    async fn test_cache_failure_only_degrades() {
        let db = Arc::new(InMemoryDatabase::new());
        let cache = Arc::new(InMemoryCache::unreachable());
        let controller = controller(db, cache.clone());

        let listener = controller.start().await.unwrap();
        assert_eq!(controller.state(), ListenState::Listening);
        assert_eq!(controller.local_addr(), Some(listener.local_addr().unwrap()));
        assert_eq!(cache.connect_count(), 1);
        assert!(!cache.is_connected());
    }

    #[tokio::test]
    async fn test_cache_connects_before_database() {
        let journal = Journal::new();
        let db = Arc::new(InMemoryDatabase::new().with_journal(journal.clone()));
        let cache = Arc::new(InMemoryCache::unreachable().with_journal(journal.clone()));
        let controller = controller(db, cache);

        controller.start().await.unwrap();
        controller.shutdown(ShutdownReason::Terminate).await;

        assert_eq!(
            journal.events(),
            vec![
                "cache.connect",
                "database.connect",
                "database.disconnect",
                "cache.disconnect"
            ]
        );
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let controller = controller(Arc::new(InMemoryDatabase::new()), Arc::new(InMemoryCache::new()));
        let _listener = controller.start().await.unwrap();

        assert!(matches!(
            controller.start().await,
            Err(LifecycleError::AlreadyStarted(ListenState::Listening))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let db = Arc::new(InMemoryDatabase::new());
        let cache = Arc::new(InMemoryCache::new());
        let controller = controller(db.clone(), cache.clone());
        let _listener = controller.start().await.unwrap();

        let (first, second) = tokio::join!(
            controller.shutdown(ShutdownReason::Terminate),
            controller.shutdown(ShutdownReason::Interrupt),
        );

        assert!(first);
        assert!(!second);
        assert!(!controller.shutdown(ShutdownReason::Terminate).await);
        assert_eq!(db.disconnect_count(), 1);
        assert_eq!(cache.disconnect_count(), 1);
        assert_eq!(controller.state(), ListenState::Stopped);
    }

    #[tokio::test]
    async fn test_disconnect_failures_do_not_stop_shutdown() {
        let db = Arc::new(InMemoryDatabase::new());
        let cache = Arc::new(InMemoryCache::new());
        db.fail_disconnect(true);
        cache.fail_disconnect(true);
        let controller = controller(db.clone(), cache.clone());
        let _listener = controller.start().await.unwrap();

        assert!(controller.shutdown(ShutdownReason::Terminate).await);
        assert_eq!(cache.disconnect_count(), 1);
        assert_eq!(controller.state(), ListenState::Stopped);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_request() {
        let db = Arc::new(InMemoryDatabase::new());
        let cache = Arc::new(InMemoryCache::new());
        let controller = Arc::new(controller(db.clone(), cache.clone()));
        let mut state = controller.watch_state();

        let runner = tokio::spawn({
            let controller = controller.clone();
            async move { controller.run().await }
        });

        state
            .wait_for(|s| *s == ListenState::Listening)
            .await
            .unwrap();
        let shutdown = controller.shutdown_handle();
        shutdown.trigger(ShutdownReason::Terminate);
        shutdown.trigger(ShutdownReason::Interrupt);

        assert!(runner.await.unwrap().is_ok());
        assert_eq!(controller.state(), ListenState::Stopped);
        assert_eq!(db.disconnect_count(), 1);
        assert_eq!(cache.disconnect_count(), 1);
    }

    #[tokio::test]
    async fn test_run_reports_fatal_startup() {
        let controller = controller(
            Arc::new(InMemoryDatabase::unreachable()),
            Arc::new(InMemoryCache::new()),
        );

        assert!(controller.run().await.is_err());
        assert_eq!(controller.state(), ListenState::Stopped);
    }

    #[tokio::test]
    async fn test_failed_startup_stops_background_tasks() {
        let controller = controller(
            Arc::new(InMemoryDatabase::unreachable()),
            Arc::new(InMemoryCache::new()),
        );
        let shutdown = controller.shutdown_handle();

        assert!(controller.run().await.is_err());

        // The sampler drops its receiver once it sees the abort.
        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while shutdown.receiver_count() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("system sampler still running after failed startup");
    }
}
