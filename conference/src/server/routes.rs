//! Router configuration for Conference Central.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::readiness_check;
use super::state::AppState;
use crate::api::{announcement, conferences, profile, registration};
use axum::{
    routing::{delete, get, post},
    Router,
};
use conference_web::correlation_id_layer;
use conference_web::handlers::health_check;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Prefix of every API route
pub const API_BASE_PATH: &str = "/_ah/api/conference/v1";

/// Build the complete Axum router.
///
/// Configures:
/// - Health checks (`/health`, `/ready`)
/// - Profile, conference, registration and announcement endpoints under
///   [`API_BASE_PATH`]
/// - Correlation ids, request tracing and CORS on every route
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Profile
        .route(
            "/profile",
            post(profile::save_profile).get(profile::get_profile),
        )
        // Conferences
        .route("/conference", post(conferences::create_conference))
        .route("/queryConferences", post(conferences::query_conferences))
        .route(
            "/getConferencesCreated",
            post(conferences::get_conferences_created),
        )
        .route(
            "/getConferencesToAttend",
            get(conferences::get_conferences_to_attend),
        )
        .route(
            "/conference/:websafeConferenceKey",
            get(conferences::get_conference),
        )
        // Registration
        .route(
            "/conference/:websafeConferenceKey/registration",
            post(registration::register_for_conference),
        )
        .route(
            "/conference/:websafeConferenceKey/unregistration",
            delete(registration::unregister_from_conference),
        )
        // Announcement
        .route("/announcement", get(announcement::get_announcement));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest(API_BASE_PATH, api_routes)
        .layer(correlation_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
