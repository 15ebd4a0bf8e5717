//! Health check endpoints.
//!
//! `GET /health` is a liveness check and never touches dependencies.
//! Readiness is service specific: the application checks its collaborators
//! and returns a [`ReadinessReport`], which renders as 200 when every
//! component is healthy and 503 otherwise.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Simple health check endpoint (for basic liveness).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Health of one component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// Component is fully operational
    Healthy,
    /// Component is not operational
    Unhealthy,
}

/// Result of checking one dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentHealth {
    /// Name of the component being checked
    pub component: String,
    /// Current health status
    pub status: HealthStatus,
    /// Failure details, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    /// A healthy component
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    /// An unhealthy component with the reason
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

/// Readiness of the whole service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    /// Overall status: healthy only if every component is
    pub status: HealthStatus,
    /// Individual checks
    pub components: Vec<ComponentHealth>,
}

impl ReadinessReport {
    /// Aggregates component checks
    #[must_use]
    pub fn from_components(components: Vec<ComponentHealth>) -> Self {
        let status = if components
            .iter()
            .all(|c| c.status == HealthStatus::Healthy)
        {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        Self { status, components }
    }

    /// HTTP status of the report
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ReadinessReport {
    fn into_response(self) -> Response {
        if self.status == HealthStatus::Unhealthy {
            tracing::warn!(components = ?self.components, "Service not ready");
        }
        (self.status_code(), Json(self)).into_response()
    }
}
