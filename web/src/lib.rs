//! Axum integration for Conference Central.
//!
//! The HTTP layer is the imperative shell around the conference service:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, trusted headers
//! │  - Request parsing                      │  ← Correlation ids, logging
//! │  - Response serialization               │  ← Error mapping
//! ├─────────────────────────────────────────┤
//! │         Conference service              │
//! │  - Reducers (registration, creation)    │  ← Pure, tested in memory
//! │  - Record store, cache, task queue      │  ← Injected collaborators
//! └─────────────────────────────────────────┘
//! ```
//!
//! This crate holds the parts that are independent of the routes:
//! [`AppError`], the [`Caller`] and [`CorrelationId`] extractors, the
//! correlation middleware and the health types.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{Caller, CorrelationId, USER_EMAIL_HEADER, USER_ID_HEADER};
pub use middleware::{correlation_id_layer, CORRELATION_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
