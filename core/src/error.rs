//! Error taxonomy of the conference operations.
//!
//! Every service operation fails with a [`ConferenceError`]. The web layer
//! maps each variant to an HTTP status via [`ConferenceError::status_code`].

use crate::cache::CacheError;
use crate::query::QueryError;
use crate::record_store::RecordStoreError;
use thiserror::Error;

/// Failure of a conference operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConferenceError {
    /// The operation needs a caller identity and none was supplied
    #[error("Authorization required")]
    Unauthenticated,

    /// A referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// The request contradicts the current registration state
    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure inside the registration transaction
    #[error("{0}")]
    Forbidden(String),

    /// The query form breaks a query rule
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),

    /// An input form is invalid
    #[error("{0}")]
    Validation(String),

    /// The record store failed outside the registration transaction
    #[error("Store error: {0}")]
    Store(#[from] RecordStoreError),

    /// The announcement cache could not be read
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl ConferenceError {
    /// `NotFound` for a conference key that does not resolve
    #[must_use]
    pub fn conference_not_found(websafe_key: &str) -> Self {
        Self::NotFound(format!("No Conference found with key: {websafe_key}"))
    }

    /// HTTP status the error maps to
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Forbidden(_) => 403,
            Self::InvalidQuery(_) | Self::Validation(_) => 400,
            Self::Store(_) => 500,
            Self::Cache(_) => 503,
        }
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::Cache(_) => "CACHE_UNAVAILABLE",
        }
    }
}
