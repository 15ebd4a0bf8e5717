//! # Conference Central Testing
//!
//! Testing utilities and helpers for Conference Central.
//!
//! This crate provides:
//! - A record store wrapper that injects commit failures
//! - Fixtures for identities, forms and conferences
//! - Property-based testing strategies
//! - [`ReducerTest`], a Given-When-Then builder for reducers
//!
//! ## Example
//!
//! ```ignore
//! use conference_testing::{fixtures, ReducerTest};
//!
//! ReducerTest::new(RegistrationReducer::new())
//!     .with_env(RegistrationEnvironment)
//!     .given_state(fixtures::registration_state(1))
//!     .when_action(RegistrationAction::Register)
//!     .then_state(|state| {
//!         assert_eq!(state.conference.as_ref().map(|c| c.seats_available), Some(0));
//!     })
//!     .run();
//! ```

mod reducer_test;

pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations for testing.
pub mod mocks {
    use conference_core::query::ConferenceQuery;
    use conference_core::record_store::{
        RecordStore, RecordStoreError, RecordWrite, StoreFuture, Versioned,
    };
    use conference_core::types::{Conference, ConferenceKey, Profile, UserId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// What a [`FlakyRecordStore`] does to the commits it intercepts
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum InjectedFailure {
        /// Report a version conflict
        Conflict,
        /// Report a backend failure
        Database,
    }

    /// Record store wrapper that fails the first `n` commits.
    ///
    /// Reads always go to the wrapped store.
    #[derive(Clone)]
    pub struct FlakyRecordStore<S> {
        inner: S,
        remaining_failures: Arc<AtomicUsize>,
        failure: InjectedFailure,
        commits_attempted: Arc<AtomicUsize>,
    }

    impl<S: RecordStore> FlakyRecordStore<S> {
        /// Wraps `inner`, failing the next `failures` commits with `failure`
        #[must_use]
        pub fn new(inner: S, failures: usize, failure: InjectedFailure) -> Self {
            Self {
                inner,
                remaining_failures: Arc::new(AtomicUsize::new(failures)),
                failure,
                commits_attempted: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Number of commits attempted so far, failed ones included
        #[must_use]
        pub fn commits_attempted(&self) -> usize {
            self.commits_attempted.load(Ordering::SeqCst)
        }

        fn take_failure(&self) -> Option<RecordStoreError> {
            self.remaining_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .ok()
                .map(|_| match self.failure {
                    InjectedFailure::Conflict => RecordStoreError::ConcurrencyConflict {
                        record: "injected".to_string(),
                        expected: None,
                        actual: None,
                    },
                    InjectedFailure::Database => {
                        RecordStoreError::DatabaseError("injected failure".to_string())
                    }
                })
        }
    }

    impl<S: RecordStore> RecordStore for FlakyRecordStore<S> {
        fn get_profile(&self, user_id: &UserId) -> StoreFuture<'_, Option<Versioned<Profile>>> {
            self.inner.get_profile(user_id)
        }

        fn get_profiles(&self, user_ids: &[UserId]) -> StoreFuture<'_, Vec<Profile>> {
            self.inner.get_profiles(user_ids)
        }

        fn get_conference(
            &self,
            key: &ConferenceKey,
        ) -> StoreFuture<'_, Option<Versioned<Conference>>> {
            self.inner.get_conference(key)
        }

        fn get_conferences(&self, keys: &[ConferenceKey]) -> StoreFuture<'_, Vec<Conference>> {
            self.inner.get_conferences(keys)
        }

        fn query_conferences(&self, query: &ConferenceQuery) -> StoreFuture<'_, Vec<Conference>> {
            self.inner.query_conferences(query)
        }

        fn conferences_by_organizer(&self, organizer: &UserId) -> StoreFuture<'_, Vec<Conference>> {
            self.inner.conferences_by_organizer(organizer)
        }

        fn commit(&self, writes: Vec<RecordWrite>) -> StoreFuture<'_, ()> {
            self.commits_attempted.fetch_add(1, Ordering::SeqCst);
            match self.take_failure() {
                Some(error) => Box::pin(async move { Err(error) }),
                None => self.inner.commit(writes),
            }
        }

        fn ping(&self) -> StoreFuture<'_, ()> {
            self.inner.ping()
        }
    }
}

/// Fixtures for common test data.
pub mod fixtures {
    use chrono::NaiveDate;
    use conference_core::registration::RegistrationState;
    use conference_core::types::{
        Conference, ConferenceForm, ConferenceId, ConferenceKey, Identity, Profile, UserId,
    };

    /// The organizer used across tests
    #[must_use]
    pub fn organizer() -> Identity {
        Identity::new("organizer-1", "organizer@example.com")
    }

    /// An attendee identity numbered `n`
    #[must_use]
    pub fn attendee(n: usize) -> Identity {
        Identity::new(format!("attendee-{n}"), format!("attendee{n}@example.com"))
    }

    /// A valid conference form with `max_attendees` seats
    #[must_use]
    pub fn conference_form(name: &str, max_attendees: u32) -> ConferenceForm {
        ConferenceForm {
            name: Some(name.to_string()),
            description: Some(format!("{name}: talks and workshops")),
            topics: Some(vec!["Rust".to_string(), "Systems".to_string()]),
            city: Some("London".to_string()),
            start_date: NaiveDate::from_ymd_opt(2026, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 3),
            max_attendees: Some(max_attendees),
        }
    }

    /// A conference organized by [`organizer`] with `max_attendees` seats
    #[must_use]
    pub fn conference(name: &str, max_attendees: u32) -> Conference {
        let key = ConferenceKey::new(organizer().user_id, ConferenceId::new());
        Conference::from_form(key, conference_form(name, max_attendees))
    }

    /// Registration state for attendee 1 and a fresh conference with `seats` seats
    #[must_use]
    pub fn registration_state(seats: u32) -> RegistrationState {
        let conference = conference("Fixture Conf", seats);
        RegistrationState::new(
            conference.key.clone(),
            Some(conference),
            Profile::new_default(&attendee(1)),
        )
    }

    /// A key that no store knows about
    #[must_use]
    pub fn unknown_key() -> ConferenceKey {
        ConferenceKey::new(UserId::new("nobody"), ConferenceId::new())
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use conference_core::registration::RegistrationAction;
    use proptest::prelude::*;

    /// One registration command issued by one of `users` attendees
    #[derive(Clone, Debug)]
    pub struct Command {
        /// Index of the attendee
        pub user: usize,
        /// `Register` or `Unregister`
        pub action: RegistrationAction,
    }

    /// Strategy for a register/unregister command from one of `users` attendees
    pub fn command(users: usize) -> impl Strategy<Value = Command> {
        (
            0..users.max(1),
            prop_oneof![
                Just(RegistrationAction::Register),
                Just(RegistrationAction::Unregister)
            ],
        )
            .prop_map(|(user, action)| Command { user, action })
    }

    /// Strategy for a sequence of up to `max_len` commands
    pub fn commands(users: usize, max_len: usize) -> impl Strategy<Value = Vec<Command>> {
        prop::collection::vec(command(users), 0..=max_len)
    }
}

// Re-export commonly used items
pub use mocks::{FlakyRecordStore, InjectedFailure};

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use conference_core::record_store::{RecordStore, RecordStoreError, RecordWrite};
    use conference_runtime::memory::InMemoryRecordStore;

    #[tokio::test]
    async fn flaky_store_fails_then_delegates() {
        let store = FlakyRecordStore::new(InMemoryRecordStore::new(), 1, InjectedFailure::Conflict);
        let conference = fixtures::conference("Flaky", 1);

        let first = store
            .commit(vec![RecordWrite::conference(conference.clone(), None)])
            .await;
        assert!(matches!(first, Err(RecordStoreError::ConcurrencyConflict { .. })));

        store
            .commit(vec![RecordWrite::conference(conference.clone(), None)])
            .await
            .unwrap();
        assert_eq!(store.commits_attempted(), 2);
        assert!(store.get_conference(&conference.key).await.unwrap().is_some());
    }
}
