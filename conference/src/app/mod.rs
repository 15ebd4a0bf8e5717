//! Application layer - the conference service and the wiring around it.
//!
//! - [`ConferenceService`]: loads records, runs reducers, commits with
//!   optimistic versioning and executes follow-up effects
//! - [`ConferenceApp`]: builds the service over the configured backends

mod coordinator;
mod services;

pub use coordinator::{ConferenceApp, StartupError};
pub use services::{ConferenceService, ConferenceView};
