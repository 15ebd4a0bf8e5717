//! Keyed record store abstraction.
//!
//! Profiles and conferences are persisted as versioned records. Reads return
//! the record together with its [`Version`]; writes go through
//! [`RecordStore::commit`], which applies a batch atomically only if every
//! record is still at the version the caller read.

use crate::query::ConferenceQuery;
use crate::types::{Conference, ConferenceKey, Profile, UserId, Version};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`RecordStore`] methods
pub type StoreFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, RecordStoreError>> + Send + 'a>>;

/// A record together with the version it was read at
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Versioned<T> {
    /// The record
    pub record: T,
    /// Version of the stored record
    pub version: Version,
}

impl<T> Versioned<T> {
    /// Creates a new `Versioned`
    #[must_use]
    pub const fn new(record: T, version: Version) -> Self {
        Self { record, version }
    }
}

/// One write inside an atomic commit.
///
/// `expected` is the version the caller read; `None` means the record must
/// not exist yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordWrite {
    /// Insert or update a profile
    Profile {
        /// New content
        profile: Profile,
        /// Version the caller based the write on
        expected: Option<Version>,
    },
    /// Insert or update a conference
    Conference {
        /// New content
        conference: Conference,
        /// Version the caller based the write on
        expected: Option<Version>,
    },
}

impl RecordWrite {
    /// Write of a profile read at `expected`
    #[must_use]
    pub const fn profile(profile: Profile, expected: Option<Version>) -> Self {
        Self::Profile { profile, expected }
    }

    /// Write of a conference read at `expected`
    #[must_use]
    pub const fn conference(conference: Conference, expected: Option<Version>) -> Self {
        Self::Conference {
            conference,
            expected,
        }
    }

    /// Human-readable record identity, for errors and logs
    #[must_use]
    pub fn record_name(&self) -> String {
        match self {
            Self::Profile { profile, .. } => format!("profile {}", profile.user_id),
            Self::Conference { conference, .. } => format!("conference {}", conference.key.id()),
        }
    }

    /// Version the caller based the write on
    #[must_use]
    pub const fn expected(&self) -> Option<Version> {
        match self {
            Self::Profile { expected, .. } | Self::Conference { expected, .. } => *expected,
        }
    }
}

/// Errors raised by record stores
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordStoreError {
    /// A record changed (or appeared) since it was read
    #[error("Concurrency conflict on {record}: expected version {expected:?}, found {actual:?}")]
    ConcurrencyConflict {
        /// Record that conflicted
        record: String,
        /// Version the caller expected
        expected: Option<Version>,
        /// Version actually stored
        actual: Option<Version>,
    },

    /// The backend failed
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored value could not be decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RecordStoreError {
    /// Whether retrying the read-modify-write cycle can succeed
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

/// Versioned storage for profiles and conferences.
///
/// Note: Returns boxed futures instead of `async fn` to be dyn-compatible
/// (object-safe), so services can hold an `Arc<dyn RecordStore>`.
pub trait RecordStore: Send + Sync {
    /// Loads a profile.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] if the backend fails.
    fn get_profile(&self, user_id: &UserId) -> StoreFuture<'_, Option<Versioned<Profile>>>;

    /// Loads several profiles at once; missing ones are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] if the backend fails.
    fn get_profiles(&self, user_ids: &[UserId]) -> StoreFuture<'_, Vec<Profile>>;

    /// Loads a conference by its full key.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] if the backend fails.
    fn get_conference(&self, key: &ConferenceKey) -> StoreFuture<'_, Option<Versioned<Conference>>>;

    /// Loads several conferences in key order; missing ones are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] if the backend fails.
    fn get_conferences(&self, keys: &[ConferenceKey]) -> StoreFuture<'_, Vec<Conference>>;

    /// Runs a translated conference query.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] if the backend fails.
    fn query_conferences(&self, query: &ConferenceQuery) -> StoreFuture<'_, Vec<Conference>>;

    /// Conferences organized by `organizer`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] if the backend fails.
    fn conferences_by_organizer(&self, organizer: &UserId) -> StoreFuture<'_, Vec<Conference>>;

    /// Applies all writes atomically.
    ///
    /// Every record gets its version bumped (new records start at
    /// [`Version::initial`]).
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::ConcurrencyConflict`] if any record is not
    /// at its expected version, in which case nothing is written.
    fn commit(&self, writes: Vec<RecordWrite>) -> StoreFuture<'_, ()>;

    /// Checks that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError`] if it is not.
    fn ping(&self) -> StoreFuture<'_, ()>;
}
