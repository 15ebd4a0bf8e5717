//! Seat registration endpoints.
//!
//! Both return `{"result": true, "reason": ...}` on success. Refusals map to
//! 404 (unknown conference), 409 (already registered, no seats, not
//! registered) or 403 (unexpected failure).

use crate::server::AppState;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use conference_core::types::WrappedBoolean;
use conference_web::{AppError, Caller, CorrelationId};

/// Register the caller for a conference.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/_ah/api/conference/v1/conference/<websafeKey>/registration \
///   -H "X-Authenticated-User-Id: 1234" \
///   -H "X-Authenticated-User-Email: ada@example.com"
/// ```
pub async fn register_for_conference(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    caller: Caller,
    websafe_key: Result<Path<String>, PathRejection>,
) -> Result<Json<WrappedBoolean>, AppError> {
    let Path(websafe_key) = websafe_key?;
    tracing::debug!(correlation_id = %correlation_id.0, conference = %websafe_key, "Registering");

    let outcome = state
        .service
        .register_for_conference(caller.identity(), &websafe_key)
        .await?;
    Ok(Json(outcome))
}

/// Unregister the caller from a conference.
pub async fn unregister_from_conference(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    caller: Caller,
    websafe_key: Result<Path<String>, PathRejection>,
) -> Result<Json<WrappedBoolean>, AppError> {
    let Path(websafe_key) = websafe_key?;
    tracing::debug!(correlation_id = %correlation_id.0, conference = %websafe_key, "Unregistering");

    let outcome = state
        .service
        .unregister_from_conference(caller.identity(), &websafe_key)
        .await?;
    Ok(Json(outcome))
}
