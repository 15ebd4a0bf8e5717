//! Conference endpoints.

use crate::app::ConferenceView;
use crate::server::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use conference_core::query::ConferenceQueryForm;
use conference_core::types::{Conference, ConferenceForm};
use conference_web::{AppError, Caller, CorrelationId};

/// Create a conference organized by the caller.
///
/// Requires authentication. The organizer receives a confirmation email
/// through the task queue.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/_ah/api/conference/v1/conference \
///   -H "X-Authenticated-User-Id: 1234" \
///   -H "X-Authenticated-User-Email: ada@example.com" \
///   -H "Content-Type: application/json" \
///   -d '{"name": "RustConf", "city": "Portland", "startDate": "2026-09-08", "maxAttendees": 500}'
/// ```
pub async fn create_conference(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    caller: Caller,
    form: Result<Json<ConferenceForm>, JsonRejection>,
) -> Result<Json<Conference>, AppError> {
    let Json(form) = form?;
    tracing::debug!(correlation_id = %correlation_id.0, "Creating conference");

    let conference = state
        .service
        .create_conference(caller.identity(), form)
        .await?;
    Ok(Json(conference))
}

/// Query conferences with filters.
///
/// Public endpoint. All inequality filters must target the same field.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/_ah/api/conference/v1/queryConferences \
///   -H "Content-Type: application/json" \
///   -d '{"filters": [{"field": "CITY", "operator": "EQ", "value": "London"},
///                    {"field": "MONTH", "operator": "GT", "value": "6"}]}'
/// ```
pub async fn query_conferences(
    State(state): State<AppState>,
    form: Result<Json<ConferenceQueryForm>, JsonRejection>,
) -> Result<Json<Vec<ConferenceView>>, AppError> {
    let Json(form) = form?;
    Ok(Json(state.service.query_conferences(&form).await?))
}

/// Conferences organized by the caller, ordered by name.
///
/// Requires authentication.
pub async fn get_conferences_created(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Conference>>, AppError> {
    Ok(Json(
        state
            .service
            .get_conferences_created(caller.identity())
            .await?,
    ))
}

/// Look up a conference by its websafe key.
///
/// Public endpoint.
pub async fn get_conference(
    State(state): State<AppState>,
    websafe_key: Result<Path<String>, PathRejection>,
) -> Result<Json<Conference>, AppError> {
    let Path(websafe_key) = websafe_key?;
    Ok(Json(state.service.get_conference(&websafe_key).await?))
}

/// Conferences the caller registered for.
///
/// Requires authentication.
pub async fn get_conferences_to_attend(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Conference>>, AppError> {
    Ok(Json(
        state
            .service
            .get_conferences_to_attend(caller.identity())
            .await?,
    ))
}
