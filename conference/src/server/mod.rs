//! HTTP server module for Conference Central.
//!
//! This module provides the Axum-based HTTP server with:
//! - Application state management
//! - Health and readiness endpoints
//! - Router configuration

pub mod health;
pub mod routes;
pub mod state;

pub use health::readiness_check;
pub use routes::{build_router, API_BASE_PATH};
pub use state::AppState;
