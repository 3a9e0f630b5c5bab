//! Dependency handles.
//!
//! # Data Flow
//! ```text
//! Startup:   LifecycleController → cache.connect() → database.ensure_connection()
//! Health:    HealthAggregator    → database.ensure_connection() (round-trip probe)
//!                                → cache.is_connected()        (local indicator)
//! Shutdown:  LifecycleController → database.disconnect() → cache.disconnect()
//! ```
//!
//! # Design Decisions
//! - The database is mandatory: its failure aborts startup and fails health
//! - The cache is optional: its failure only degrades capability
//! - Handles are single shared instances (`Arc<dyn ...>`); each one guards its
//!   own connection state so callers can observe either side of a transition
//! - connect/disconnect are safe to call on a handle that never connected

pub mod cache;
pub mod database;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use cache::{CacheService, RedisCache};
pub use database::PostgresDatabase;
pub use memory::{InMemoryCache, InMemoryDatabase, Journal};

/// Errors raised by dependency handles.
#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("{dependency} did not respond within {timeout:?}")]
    Timeout {
        dependency: &'static str,
        timeout: Duration,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0} is unavailable")]
    Unavailable(String),
}

/// Optional dependency: failure to connect is logged and tolerated.
#[async_trait]
pub trait CacheHandle: Send + Sync {
    /// Name used in logs and as the health report key.
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn connect(&self) -> Result<(), DependencyError>;

    async fn disconnect(&self) -> Result<(), DependencyError>;

    /// Local liveness indicator. Never performs I/O.
    fn is_connected(&self) -> bool;
}

/// Mandatory dependency: failure to connect is fatal to startup.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    /// Name used in logs and as the health report key.
    fn name(&self) -> &'static str {
        "database"
    }

    /// Connect if not yet connected, then issue a round-trip probe.
    ///
    /// Fails when the database cannot be reached, even if a connection was
    /// established earlier.
    async fn ensure_connection(&self) -> Result<(), DependencyError>;

    async fn disconnect(&self) -> Result<(), DependencyError>;
}
