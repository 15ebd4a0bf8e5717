//! Application state for the HTTP server.

use crate::app::ConferenceService;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Conference operations
    pub service: Arc<ConferenceService>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(service: Arc<ConferenceService>) -> Self {
        Self { service }
    }
}
