//! Profile endpoints.

use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use conference_core::types::{Profile, ProfileForm};
use conference_web::{AppError, Caller, CorrelationId};

/// Create or update the caller's profile.
///
/// Requires authentication. Fields left out of the form keep their value.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/_ah/api/conference/v1/profile \
///   -H "X-Authenticated-User-Id: 1234" \
///   -H "X-Authenticated-User-Email: ada@example.com" \
///   -H "Content-Type: application/json" \
///   -d '{"displayName": "Ada", "teeShirtSize": "M"}'
/// ```
pub async fn save_profile(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    caller: Caller,
    form: Result<Json<ProfileForm>, JsonRejection>,
) -> Result<Json<Profile>, AppError> {
    let Json(form) = form?;
    tracing::debug!(correlation_id = %correlation_id.0, "Saving profile");

    let profile = state.service.save_profile(caller.identity(), form).await?;
    Ok(Json(profile))
}

/// Get the caller's profile.
///
/// Requires authentication. Returns 204 when the caller never saved one.
pub async fn get_profile(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Response, AppError> {
    Ok(match state.service.get_profile(caller.identity()).await? {
        Some(profile) => Json(profile).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
