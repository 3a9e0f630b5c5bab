//! Health report returned by `GET /health`.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStatus {
    Connected,
    Disconnected,
}

impl From<bool> for DependencyStatus {
    fn from(connected: bool) -> Self {
        if connected {
            DependencyStatus::Connected
        } else {
            DependencyStatus::Disconnected
        }
    }
}

/// Point-in-time health of the process. Built fresh for every request.
///
/// Serializes flat: the per-dependency entries become top-level fields, so a
/// healthy body reads `{status, service, database, redis, timestamp}` and an
/// unhealthy one `{status, service, error, timestamp}`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    status: HealthStatus,
    service: String,
    #[serde(flatten)]
    dependencies: BTreeMap<&'static str, DependencyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(serialize_with = "iso8601_millis")]
    timestamp: DateTime<Utc>,
}

impl HealthReport {
    pub fn healthy(
        service: impl Into<String>,
        dependencies: BTreeMap<&'static str, DependencyStatus>,
    ) -> Self {
        Self {
            status: HealthStatus::Healthy,
            service: service.into(),
            dependencies,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn unhealthy(service: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            service: service.into(),
            dependencies: BTreeMap::new(),
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn dependency(&self, name: &str) -> Option<DependencyStatus> {
        self.dependencies.get(name).copied()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

fn iso8601_millis<S: Serializer>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}
