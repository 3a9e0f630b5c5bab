//! Health aggregation over the dependency handles.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::deps::{CacheHandle, DatabaseHandle};
use crate::health::report::{DependencyStatus, HealthReport};
use crate::identity::ServiceIdentity;

/// Error text reported to callers when the mandatory probe fails.
pub const DATABASE_FAILURE: &str = "Database connection failed";

pub struct HealthAggregator {
    identity: ServiceIdentity,
    database: Arc<dyn DatabaseHandle>,
    cache: Arc<dyn CacheHandle>,
}

impl HealthAggregator {
    pub fn new(
        identity: ServiceIdentity,
        database: Arc<dyn DatabaseHandle>,
        cache: Arc<dyn CacheHandle>,
    ) -> Self {
        Self {
            identity,
            database,
            cache,
        }
    }

    /// Probe the database and read the cache indicator.
    ///
    /// Only the database decides the overall status. Nothing is cached
    /// between calls.
    pub async fn compute(&self) -> HealthReport {
        if let Err(e) = self.database.ensure_connection().await {
            tracing::error!(error = %e, "Health check failed");
            return HealthReport::unhealthy(self.identity.name(), DATABASE_FAILURE);
        }

        let mut dependencies = BTreeMap::new();
        dependencies.insert(self.database.name(), DependencyStatus::Connected);
        dependencies.insert(self.cache.name(), self.cache_status());

        HealthReport::healthy(self.identity.name(), dependencies)
    }

    fn cache_status(&self) -> DependencyStatus {
        // The indicator is local, but a misbehaving handle must still not
        // take the health check down with it.
        let cache = &self.cache;
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cache.is_connected())) {
            Ok(connected) => DependencyStatus::from(connected),
            Err(_) => {
                tracing::warn!(dependency = cache.name(), "Cache liveness check failed");
                DependencyStatus::Disconnected
            }
        }
    }
}
