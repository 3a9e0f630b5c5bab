//! In-memory dependency handles.
//!
//! Used by the test suites and for running the service without Postgres or
//! Redis. Reachability can be flipped at runtime and every call is counted.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::deps::{CacheHandle, DatabaseHandle, DependencyError};

/// Shared, ordered record of handle calls (`"cache.connect"`, ...).
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<&'static str>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: &'static str) {
        if let Ok(mut events) = self.0.lock() {
            events.push(event);
        }
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.0.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

#[derive(Default)]
struct Counters {
    reachable: AtomicBool,
    connected: AtomicBool,
    fail_disconnect: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

pub struct InMemoryDatabase {
    state: Counters,
    journal: Journal,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        let db = Self {
            state: Counters::default(),
            journal: Journal::new(),
        };
        db.set_reachable(true);
        db
    }

    pub fn unreachable() -> Self {
        let db = Self::new();
        db.set_reachable(false);
        db
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn fail_disconnect(&self, fail: bool) {
        self.state.fail_disconnect.store(fail, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    /// Number of `ensure_connection` calls (connects and probes).
    pub fn probe_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseHandle for InMemoryDatabase {
    async fn ensure_connection(&self) -> Result<(), DependencyError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        self.journal.record("database.connect");
        tokio::task::yield_now().await;

        if self.state.reachable.load(Ordering::SeqCst) {
            self.state.connected.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            self.state.connected.store(false, Ordering::SeqCst);
            Err(DependencyError::Unavailable("database".to_string()))
        }
    }

    async fn disconnect(&self) -> Result<(), DependencyError> {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        self.journal.record("database.disconnect");
        tokio::task::yield_now().await;

        self.state.connected.store(false, Ordering::SeqCst);
        if self.state.fail_disconnect.load(Ordering::SeqCst) {
            return Err(DependencyError::Unavailable("database".to_string()));
        }
        Ok(())
    }
}

pub struct InMemoryCache {
    state: Counters,
    journal: Journal,
}

impl InMemoryCache {
    pub fn new() -> Self {
        let cache = Self {
            state: Counters::default(),
            journal: Journal::new(),
        };
        cache.set_reachable(true);
        cache
    }

    pub fn unreachable() -> Self {
        let cache = Self::new();
        cache.set_reachable(false);
        cache
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn fail_disconnect(&self, fail: bool) {
        self.state.fail_disconnect.store(fail, Ordering::SeqCst);
    }

    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheHandle for InMemoryCache {
    async fn connect(&self) -> Result<(), DependencyError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        self.journal.record("cache.connect");
        tokio::task::yield_now().await;

        if self.state.reachable.load(Ordering::SeqCst) {
            self.state.connected.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            Err(DependencyError::Unavailable("redis".to_string()))
        }
    }

    async fn disconnect(&self) -> Result<(), DependencyError> {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        self.journal.record("cache.disconnect");
        tokio::task::yield_now().await;

        self.state.connected.store(false, Ordering::SeqCst);
        if self.state.fail_disconnect.load(Ordering::SeqCst) {
            return Err(DependencyError::Unavailable("redis".to_string()));
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }
}
