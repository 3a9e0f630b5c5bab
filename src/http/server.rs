//! HTTP router setup.
//!
//! # Responsibilities
//! - Create the Axum Router with the operational endpoints
//! - Mount the domain router
//! - Wire up middleware (tracing, request ID, metrics, limits, headers)
//! - Terminal 404 and 500 handling

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::domain::DomainRouter;
use crate::health::{HealthAggregator, HealthReport};
use crate::http::request::{make_span, MakeRequestUuid};
use crate::http::response::{handle_panic, not_found};
use crate::identity::ServiceIdentity;
use crate::observability::metrics::{self, MetricsExporter};

pub const HEALTH_PATH: &str = "/health";
pub const METRICS_PATH: &str = "/metrics";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub identity: ServiceIdentity,
    pub health: Arc<HealthAggregator>,
    pub metrics: Arc<dyn MetricsExporter>,
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, domain: &dyn DomainRouter, config: &ServiceConfig) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route(METRICS_PATH, get(metrics_handler))
        .method_not_allowed_fallback(not_found)
        .with_state(state)
        // A known path with the wrong method is still "not found".
        .nest(
            domain.mount_path(),
            domain.router().method_not_allowed_fallback(not_found),
        )
        .fallback(not_found)
        .layer(middleware::from_fn(metrics::track_metrics))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_span::<Body>))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn health_handler(State(state): State<AppState>) -> HealthReport {
    state.health.compute().await
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, state.metrics.content_type())], body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
