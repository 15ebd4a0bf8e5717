//! Announcement endpoint.

use crate::server::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use conference_web::AppError;

/// The cached announcement, or 204 when nothing is cached.
///
/// Public endpoint. The announcement is written by an external job.
pub async fn get_announcement(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(match state.service.get_announcement().await? {
        Some(announcement) => Json(announcement).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
