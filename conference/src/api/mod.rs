//! HTTP API endpoints for Conference Central.
//!
//! Handlers are thin: extract the caller and the input, call the
//! [`ConferenceService`](crate::app::ConferenceService), map the result.
//! - Profile: save and read the caller's profile
//! - Conferences: create, query and look up conferences
//! - Registration: take and give back seats
//! - Announcement: the cached announcement

pub mod announcement;
pub mod conferences;
pub mod profile;
pub mod registration;

pub use announcement::get_announcement;
pub use conferences::{
    create_conference, get_conference, get_conferences_created, get_conferences_to_attend,
    query_conferences,
};
pub use profile::{get_profile, save_profile};
pub use registration::{register_for_conference, unregister_from_conference};
