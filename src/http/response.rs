//! Error responses.
//!
//! # Responsibilities
//! - Terminal error handling: log detail server-side, answer a generic 500
//! - Catch-all 404 for unmatched paths
//! - Turn handler panics into the same generic 500
//!
//! # Design Decisions
//! - Internal error detail never crosses into a response body
//! - `/metrics` is the only route allowed to answer with a raw error body

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::deps::DependencyError;

pub const NOT_FOUND_BODY: &str = "Not found";
pub const INTERNAL_ERROR_BODY: &str = "Internal server error";

/// Any error a handler lets escape.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, detail = ?self, "Unhandled error");
        internal_error()
    }
}

pub fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": INTERNAL_ERROR_BODY })),
    )
        .into_response()
}

pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": NOT_FOUND_BODY }))).into_response()
}

/// Response for a panicking handler.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(error = %detail, "Unhandled error");
    internal_error()
}
