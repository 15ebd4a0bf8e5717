//! # Conference Central
//!
//! A conference management backend: users keep a profile, organize and
//! query conferences, register for seats and read a cached announcement.
//!
//! ```text
//!   HTTP (axum)          api/ + server/     Caller, CorrelationId, AppError
//!        │
//!        ▼
//!   ConferenceService    app/               load → reduce → commit → effects
//!        │
//!        ├── RecordStore          memory | PostgreSQL   (optimistic versions)
//!        ├── AnnouncementCache    memory | Redis        (read only)
//!        └── TaskQueue            memory | Redis        (confirmation emails)
//! ```
//!
//! # Key Features
//!
//! ## Seat registration without double booking
//!
//! Registering reads the conference and the caller's profile, lets the
//! [`RegistrationReducer`](conference_core::registration::RegistrationReducer)
//! decide, then commits both records at the versions it read. A concurrent
//! change makes the commit fail as a whole and the cycle starts over with
//! backoff, so the last seat goes to exactly one caller.
//!
//! ## Effects after commit
//!
//! Creating a conference produces an enqueue effect for the confirmation
//! email. The service runs it only once the conference is stored.

pub mod api;
pub mod app;
pub mod config;
pub mod metrics;
pub mod server;

pub use app::{ConferenceApp, ConferenceService, ConferenceView, StartupError};
pub use config::{Config, ConfigError};
pub use server::{build_router, AppState};
