//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Install the process-wide Prometheus recorder once
//! - Expose the registry through [`MetricsExporter`] for the `/metrics` route
//! - Record request, dependency, lifecycle and system metrics
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, path, status
//! - `http_requests_duration_seconds` (histogram): latency distribution
//! - `dependency_up` (gauge): 1=connected, 0=disconnected, by dependency
//! - `lifecycle_transitions_total` (counter): controller state changes
//! - `process_*` (gauges): sampled by the system sampler
//!
//! Every series carries a global `service` label.

use std::sync::OnceLock;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::IntoResponse,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

use crate::identity::ServiceIdentity;
use crate::observability::system::SystemSample;

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to configure recorder: {0}")]
    Build(#[from] BuildError),

    #[error("failed to render metrics: {0}")]
    Render(String),
}

/// Serializes the metrics registry for scraping.
pub trait MetricsExporter: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn render(&self) -> Result<String, MetricsError>;

    /// Periodic housekeeping (histogram draining). Called by the system sampler.
    fn run_upkeep(&self) {}
}

/// Handle to the process-wide Prometheus recorder.
#[derive(Clone)]
pub struct PrometheusRegistry {
    handle: PrometheusHandle,
}

impl PrometheusRegistry {
    /// Install the global recorder, or reuse the one already installed.
    ///
    /// The `metrics` facade accepts a single recorder per process, so the
    /// first identity to install wins the `service` label.
    pub fn install(identity: &ServiceIdentity) -> Result<Self, MetricsError> {
        static INSTALLED: OnceLock<PrometheusHandle> = OnceLock::new();

        if let Some(handle) = INSTALLED.get() {
            return Ok(Self {
                handle: handle.clone(),
            });
        }

        let builder = PrometheusBuilder::new()
            .set_buckets(LATENCY_BUCKETS)?
            .add_global_label("service", identity.name());

        let handle = INSTALLED.get_or_init(|| {
            let recorder = builder.build_recorder();
            let handle = recorder.handle();
            if ::metrics::set_global_recorder(recorder).is_err() {
                tracing::warn!("A global metrics recorder was already installed");
            }
            handle
        });

        Ok(Self {
            handle: handle.clone(),
        })
    }
}

impl MetricsExporter for PrometheusRegistry {
    fn content_type(&self) -> &'static str {
        PROMETHEUS_CONTENT_TYPE
    }

    fn render(&self) -> Result<String, MetricsError> {
        Ok(self.handle.render())
    }

    fn run_upkeep(&self) {
        self.handle.run_upkeep();
    }
}

/// Middleware to record common HTTP metrics.
pub async fn track_metrics(req: Request, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    // Unmatched paths share one label so scanners cannot blow up cardinality.
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = req.method().to_string();

    let response = next.run(req).await;

    record_request(&method, &path, response.status().as_u16(), start);
    response
}

pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_owned()),
        ("path", path.to_owned()),
        ("status", status.to_string()),
    ];

    ::metrics::counter!("http_requests_total", &labels).increment(1);
    ::metrics::histogram!("http_requests_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_dependency_status(dependency: &'static str, up: bool) {
    ::metrics::gauge!("dependency_up", "dependency" => dependency).set(if up { 1.0 } else { 0.0 });
}

pub fn record_lifecycle_transition(state: &'static str) {
    ::metrics::counter!("lifecycle_transitions_total", "state" => state).increment(1);
}

pub fn record_system_sample(sample: &SystemSample) {
    ::metrics::gauge!("process_resident_memory_bytes").set(sample.resident_memory_bytes as f64);
    ::metrics::gauge!("process_virtual_memory_bytes").set(sample.virtual_memory_bytes as f64);
    ::metrics::gauge!("process_cpu_usage_percent").set(f64::from(sample.cpu_usage_percent));
    ::metrics::gauge!("process_uptime_seconds").set(sample.uptime_secs as f64);
}
