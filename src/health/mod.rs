//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → aggregator.rs
//!         → database.ensure_connection()  (round-trip probe, decides status)
//!         → cache.is_connected()          (informational only)
//!     → report.rs (HealthReport, 200 or 503)
//! ```
//!
//! # Design Decisions
//! - Mandatory dependency failure → unhealthy (503)
//! - Optional dependency failure → reported as "disconnected", still 200
//! - Reports are never cached across calls

pub mod aggregator;
pub mod report;

pub use aggregator::HealthAggregator;
pub use report::{DependencyStatus, HealthReport, HealthStatus};
