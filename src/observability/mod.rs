//! Observability subsystem (telemetry sink).
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Producers besides handlers:
//!     → metrics::track_metrics (per-request middleware)
//!     → system.rs (periodic process sampler)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → GET /metrics (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The registry is installed once at startup and never torn down
//! - Request ID flows through the request span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod system;

pub use logging::init_logging;
pub use metrics::{MetricsError, MetricsExporter, PrometheusRegistry};
pub use system::SystemSampler;
