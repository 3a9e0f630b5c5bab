//! Saga routes.
//!
//! Orchestration endpoints are not implemented yet; `GET /api/sagas` only
//! confirms the service is up.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::domain::DomainRouter;

pub const API_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize)]
pub struct SagaIndex {
    pub message: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Default, Clone)]
pub struct SagaRouter;

impl DomainRouter for SagaRouter {
    fn router(&self) -> Router {
        Router::new().route("/sagas", get(list_sagas))
    }
}

async fn list_sagas() -> Json<SagaIndex> {
    Json(SagaIndex {
        message: "Saga orchestrator service is running",
        version: API_VERSION,
    })
}
