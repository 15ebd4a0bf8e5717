//! Shared announcement cache (read side only).
//!
//! An external job writes a precomputed announcement string under
//! [`ANNOUNCEMENTS_KEY`]; this system only ever reads it.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Cache key holding the most recent announcement
pub const ANNOUNCEMENTS_KEY: &str = "RECENT_ANNOUNCEMENTS";

/// Errors raised by cache reads
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The cache backend could not be reached
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Read access to a shared string cache.
pub trait AnnouncementCache: Send + Sync {
    /// Returns the value stored under `key`, or `None` when nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend cannot be reached.
    fn get(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, CacheError>> + Send + '_>>;
}
