//! Service identity.

use std::fmt;
use std::sync::Arc;

/// Immutable name of the running service.
///
/// Set once at startup. Used as the `service` field of health bodies, the
/// global `service` metric label and the cache key namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceIdentity {
    name: Arc<str>,
}

impl ServiceIdentity {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
