//! Saga orchestrator service core.
//!
//! Bootstraps the service, keeps it healthy and shuts it down cleanly. The
//! saga domain itself is mounted as a [`domain::DomainRouter`].

pub mod config;
pub mod deps;
pub mod domain;
pub mod health;
pub mod http;
pub mod identity;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use identity::ServiceIdentity;
pub use lifecycle::{Components, LifecycleController, LifecycleError, Shutdown};
