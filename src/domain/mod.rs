//! Domain routing.
//!
//! The lifecycle core does not know what the service does; it mounts a
//! [`DomainRouter`] once the dependencies are live and forwards every path
//! under its mount point to it.

pub mod sagas;

use axum::Router;

pub use sagas::SagaRouter;

pub trait DomainRouter: Send + Sync {
    /// Path prefix the routes are nested under.
    fn mount_path(&self) -> &'static str {
        "/api"
    }

    /// Routes relative to the mount path. Unmatched paths fall through to the
    /// service-wide 404.
    fn router(&self) -> Router;
}
