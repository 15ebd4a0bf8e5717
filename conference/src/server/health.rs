//! Readiness endpoint for Conference Central.
//!
//! Liveness (`/health`) comes from `conference_web`; readiness also checks
//! that the record store answers.

use super::state::AppState;
use axum::extract::State;
use conference_web::handlers::{ComponentHealth, ReadinessReport};

/// Readiness check endpoint.
///
/// Returns 200 when the record store is reachable, 503 otherwise.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/ready
/// # {"status":"Healthy","components":[{"component":"record_store","status":"Healthy"}]}
/// ```
pub async fn readiness_check(State(state): State<AppState>) -> ReadinessReport {
    let record_store = match state.service.check_store().await {
        Ok(()) => ComponentHealth::healthy("record_store"),
        Err(error) => {
            tracing::warn!(error = %error, "Record store is not ready");
            ComponentHealth::unhealthy("record_store", error.to_string())
        }
    };

    ReadinessReport::from_components(vec![record_store])
}
