//! Redis handle and the namespaced cache service built on it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, RedisResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::config::CacheConfig;
use crate::deps::{CacheHandle, DependencyError};
use crate::identity::ServiceIdentity;
use crate::observability::metrics;

pub struct RedisCache {
    client: redis::Client,
    connect_timeout: Duration,
    connection: RwLock<Option<ConnectionManager>>,
    connected: AtomicBool,
}

impl RedisCache {
    /// Create a handle. Only the URL is parsed here; no I/O happens until
    /// `connect`.
    pub fn new(config: &CacheConfig) -> Result<Self, DependencyError> {
        Ok(Self {
            client: redis::Client::open(config.url.as_str())?,
            connect_timeout: config.connect_timeout(),
            connection: RwLock::new(None),
            connected: AtomicBool::new(false),
        })
    }

    /// Live connection, if the handle is connected.
    pub async fn connection(&self) -> Option<ConnectionManager> {
        self.connection.read().await.clone()
    }

    /// Fold a command result into the connected indicator.
    ///
    /// The connection manager reconnects on its own, so command outcomes are
    /// the only signal that the link dropped or came back.
    fn observe<T>(&self, result: RedisResult<T>) -> RedisResult<T> {
        match &result {
            Ok(_) => {
                if !self.connected.swap(true, Ordering::SeqCst) {
                    tracing::info!("Redis connection restored");
                    metrics::record_dependency_status(self.name(), true);
                }
            }
            Err(e) if is_link_failure(e) => {
                if self.connected.swap(false, Ordering::SeqCst) {
                    tracing::warn!(error = %e, "Redis connection lost");
                    metrics::record_dependency_status(self.name(), false);
                }
            }
            Err(_) => {}
        }
        result
    }
}

fn is_link_failure(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
}

#[async_trait]
impl CacheHandle for RedisCache {
    async fn connect(&self) -> Result<(), DependencyError> {
        let mut guard = self.connection.write().await;
        if guard.is_some() {
            return Ok(());
        }

        let mut conn = timeout(self.connect_timeout, ConnectionManager::new(self.client.clone()))
            .await
            .map_err(|_| DependencyError::Timeout {
                dependency: "redis",
                timeout: self.connect_timeout,
            })??;

        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        *guard = Some(conn);
        self.connected.store(true, Ordering::SeqCst);
        metrics::record_dependency_status(self.name(), true);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DependencyError> {
        // The connection manager closes its socket once the last clone drops.
        let previous = self.connection.write().await.take();
        self.connected.store(false, Ordering::SeqCst);
        metrics::record_dependency_status(self.name(), false);
        if previous.is_some() {
            tracing::info!("Redis connection released");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// JSON cache scoped to one service.
///
/// Keys are stored as `"{service}:{key}"`. While the underlying handle is
/// disconnected, reads are misses and writes are skipped.
#[derive(Clone)]
pub struct CacheService {
    cache: Arc<RedisCache>,
    namespace: String,
    default_ttl: Duration,
}

impl CacheService {
    pub fn new(cache: Arc<RedisCache>, identity: &ServiceIdentity, default_ttl: Duration) -> Self {
        Self {
            cache,
            namespace: identity.name().to_string(),
            default_ttl,
        }
    }

    pub fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DependencyError> {
        let Some(mut conn) = self.cache.connection().await else {
            return Ok(None);
        };

        let raw: Option<String> = self.cache.observe(conn.get(self.key(key)).await)?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Store `value` under `key`. `ttl` falls back to the configured default.
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), DependencyError> {
        let Some(mut conn) = self.cache.connection().await else {
            tracing::debug!(key, "Cache unavailable, skipping write");
            return Ok(());
        };

        let payload = serde_json::to_string(value)?;
        let seconds = ttl.unwrap_or(self.default_ttl).as_secs().max(1);
        let _: () = self.cache.observe(conn.set_ex(self.key(key), payload, seconds).await)?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), DependencyError> {
        let Some(mut conn) = self.cache.connection().await else {
            return Ok(());
        };

        let _: () = self.cache.observe(conn.del(self.key(key)).await)?;
        Ok(())
    }
}
