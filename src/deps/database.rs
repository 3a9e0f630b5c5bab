//! Postgres handle backed by an sqlx pool.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::config::DatabaseConfig;
use crate::deps::{DatabaseHandle, DependencyError};
use crate::observability::metrics;

pub struct PostgresDatabase {
    config: DatabaseConfig,
    pool: Mutex<Option<PgPool>>,
}

impl PostgresDatabase {
    /// Create a handle. No connection is made until `ensure_connection`.
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            config: config.clone(),
            pool: Mutex::new(None),
        }
    }

    async fn pool(&self) -> Result<PgPool, DependencyError> {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        let connect_timeout = self.config.connect_timeout();
        let pool = timeout(
            connect_timeout,
            PgPoolOptions::new()
                .max_connections(self.config.max_connections)
                .acquire_timeout(connect_timeout)
                .connect(&self.config.url),
        )
        .await
        .map_err(|_| DependencyError::Timeout {
            dependency: "database",
            timeout: connect_timeout,
        })??;

        tracing::info!(max_connections = self.config.max_connections, "Database pool created");
        *guard = Some(pool.clone());
        Ok(pool)
    }
}

#[async_trait]
impl DatabaseHandle for PostgresDatabase {
    async fn ensure_connection(&self) -> Result<(), DependencyError> {
        let pool = self.pool().await?;
        let probe_timeout = self.config.connect_timeout();

        let result = match timeout(probe_timeout, sqlx::query("SELECT 1").execute(&pool)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(DependencyError::Database(e)),
            Err(_) => Err(DependencyError::Timeout {
                dependency: "database",
                timeout: probe_timeout,
            }),
        };

        metrics::record_dependency_status(self.name(), result.is_ok());
        result
    }

    async fn disconnect(&self) -> Result<(), DependencyError> {
        let pool = self.pool.lock().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            tracing::info!("Database pool closed");
        }
        metrics::record_dependency_status(self.name(), false);
        Ok(())
    }
}
