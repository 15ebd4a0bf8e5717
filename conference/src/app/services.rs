//! Conference service - the imperative shell around the reducers.
//!
//! Every operation follows the same shape:
//! 1. Resolve the caller and load the records it touches
//! 2. Run the reducer (registration, creation) or apply the form
//! 3. Commit all changed records atomically with their expected versions
//! 4. Execute follow-up effects (creation only) once the commit succeeded
//!
//! Version conflicts restart the whole read-modify-write cycle with
//! exponential backoff.

use crate::metrics;
use conference_core::cache::{AnnouncementCache, ANNOUNCEMENTS_KEY};
use conference_core::creation::{
    ConfirmationStatus, CreationAction, CreationEnvironment, CreationReducer, CreationState,
};
use conference_core::error::ConferenceError;
use conference_core::query::{ConferenceQuery, ConferenceQueryForm};
use conference_core::record_store::{RecordStore, RecordStoreError, RecordWrite};
use conference_core::registration::{
    RegistrationAction, RegistrationEnvironment, RegistrationOutcome, RegistrationReducer,
    RegistrationRejection, RegistrationState,
};
use conference_core::task_queue::TaskQueue;
use conference_core::types::{
    Announcement, Conference, ConferenceForm, ConferenceId, ConferenceKey, Identity, Profile,
    ProfileForm, UserId, Version, WrappedBoolean,
};
use conference_runtime::store::{Effects, Store};
use conference_runtime::{retry_with_predicate, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

type CreationStore = Store<CreationState, CreationAction, CreationEnvironment, CreationReducer>;

/// A conference as returned by queries, with its organizer's display name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceView {
    /// The conference record
    #[serde(flatten)]
    pub conference: Conference,
    /// Organizer's display name, or their user id when they have no profile
    pub organizer_display_name: String,
}

/// Result of one creation attempt
enum Creation {
    Rejected(String),
    Committed {
        store: CreationStore,
        effects: Effects<CreationAction>,
        conference: Conference,
    },
}

/// Conference operations over the record store, the announcement cache and
/// the task queue.
///
/// Cheap to share: hold it in an `Arc` and call it from any number of
/// request tasks.
pub struct ConferenceService {
    records: Arc<dyn RecordStore>,
    cache: Arc<dyn AnnouncementCache>,
    task_queue: Arc<dyn TaskQueue>,
    retry_policy: RetryPolicy,
}

impl ConferenceService {
    /// Create a new service with the default conflict retry policy
    #[must_use]
    pub fn new(
        records: Arc<dyn RecordStore>,
        cache: Arc<dyn AnnouncementCache>,
        task_queue: Arc<dyn TaskQueue>,
    ) -> Self {
        Self {
            records,
            cache,
            task_queue,
            retry_policy: RetryPolicy::builder()
                .max_retries(10)
                .initial_delay(Duration::from_millis(10))
                .max_delay(Duration::from_secs(1))
                .build(),
        }
    }

    /// Replace the policy used when a commit hits a version conflict
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    // ========================================================================
    // Profiles
    // ========================================================================

    /// Creates or updates the caller's profile.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a caller, `Store` if the store fails.
    pub async fn save_profile(
        &self,
        identity: Option<&Identity>,
        form: ProfileForm,
    ) -> Result<Profile, ConferenceError> {
        let identity = require_identity(identity)?;
        let form = &form;

        let profile = retry_with_predicate(
            self.retry_policy.clone(),
            move || self.save_profile_attempt(identity, form.clone()),
            RecordStoreError::is_conflict,
        )
        .await?;

        tracing::info!(user_id = %profile.user_id, "Profile saved");
        Ok(profile)
    }

    async fn save_profile_attempt(
        &self,
        identity: &Identity,
        form: ProfileForm,
    ) -> Result<Profile, RecordStoreError> {
        let (mut profile, version) = self.load_profile(identity).await?;
        profile.apply_form(form);
        self.commit(vec![RecordWrite::profile(profile.clone(), version)])
            .await?;
        Ok(profile)
    }

    /// The caller's stored profile, `None` if they never saved one.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a caller, `Store` if the store fails.
    pub async fn get_profile(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Option<Profile>, ConferenceError> {
        let identity = require_identity(identity)?;
        let stored = self.records.get_profile(&identity.user_id).await?;
        Ok(stored.map(|stored| stored.record))
    }

    // ========================================================================
    // Conferences
    // ========================================================================

    /// Creates a conference organized by the caller.
    ///
    /// The conference (and the caller's profile, if it did not exist yet) is
    /// committed first; only then is the confirmation email task enqueued. A
    /// failed enqueue is logged and does not fail the request.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a caller, `Validation` for an invalid form,
    /// `Store` if the store fails.
    pub async fn create_conference(
        &self,
        identity: Option<&Identity>,
        form: ConferenceForm,
    ) -> Result<Conference, ConferenceError> {
        let identity = require_identity(identity)?;
        let form = &form;

        let creation = retry_with_predicate(
            self.retry_policy.clone(),
            move || self.creation_attempt(identity, form.clone()),
            RecordStoreError::is_conflict,
        )
        .await?;

        let (store, effects, conference) = match creation {
            Creation::Rejected(reason) => {
                tracing::debug!(
                    user_id = %identity.user_id,
                    reason = %reason,
                    "Conference form rejected"
                );
                return Err(ConferenceError::Validation(reason));
            }
            Creation::Committed {
                store,
                effects,
                conference,
            } => (store, effects, conference),
        };

        store.execute(effects).await;
        match store.state(|s| s.confirmation.clone()).await {
            ConfirmationStatus::Queued => metrics::record_task_enqueued("queued"),
            ConfirmationStatus::Failed(error) => {
                tracing::warn!(
                    conference = %conference.key,
                    error = %error,
                    "Confirmation email task could not be enqueued"
                );
                metrics::record_task_enqueued("failed");
            }
            ConfirmationStatus::NotRequested | ConfirmationStatus::Pending => {}
        }

        metrics::record_conference_created();
        tracing::info!(
            conference = %conference.key,
            organizer = %identity.user_id,
            name = %conference.name,
            "Conference created"
        );
        Ok(conference)
    }

    async fn creation_attempt(
        &self,
        identity: &Identity,
        form: ConferenceForm,
    ) -> Result<Creation, RecordStoreError> {
        let (profile, profile_version) = self.load_profile(identity).await?;

        let store = Store::new(
            CreationState::new(profile.clone()),
            CreationReducer::new(),
            CreationEnvironment::new(Arc::clone(&self.task_queue)),
        );
        let effects = store
            .reduce(CreationAction::CreateConference {
                id: ConferenceId::new(),
                form,
            })
            .await;

        let (conference, last_error) = store
            .state(|s| (s.conference.clone(), s.last_error.clone()))
            .await;
        let Some(conference) = conference else {
            let reason = last_error.unwrap_or_else(|| "Invalid conference".to_string());
            return Ok(Creation::Rejected(reason));
        };

        let mut writes = vec![RecordWrite::conference(conference.clone(), None)];
        if profile_version.is_none() {
            writes.push(RecordWrite::profile(profile, None));
        }
        self.commit(writes).await?;

        Ok(Creation::Committed {
            store,
            effects,
            conference,
        })
    }

    /// Runs a conference query and attaches each organizer's display name.
    ///
    /// # Errors
    ///
    /// `InvalidQuery` if the form breaks a query rule, `Store` if the store
    /// fails.
    pub async fn query_conferences(
        &self,
        form: &ConferenceQueryForm,
    ) -> Result<Vec<ConferenceView>, ConferenceError> {
        let query = ConferenceQuery::from_form(form)?;
        let conferences = self.records.query_conferences(&query).await?;

        let mut organizers: Vec<UserId> = conferences
            .iter()
            .map(|conference| conference.organizer_user_id().clone())
            .collect();
        organizers.sort_unstable();
        organizers.dedup();

        let display_names: HashMap<UserId, String> = self
            .records
            .get_profiles(&organizers)
            .await?
            .into_iter()
            .map(|profile| (profile.user_id, profile.display_name))
            .collect();

        tracing::debug!(
            filters = form.filters.len(),
            results = conferences.len(),
            "Conference query executed"
        );

        Ok(conferences
            .into_iter()
            .map(|conference| {
                let organizer_display_name = display_names
                    .get(conference.organizer_user_id())
                    .cloned()
                    .unwrap_or_else(|| conference.organizer_user_id().to_string());
                ConferenceView {
                    conference,
                    organizer_display_name,
                }
            })
            .collect())
    }

    /// Conferences organized by the caller, ordered by name.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a caller, `Store` if the store fails.
    pub async fn get_conferences_created(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Vec<Conference>, ConferenceError> {
        let identity = require_identity(identity)?;
        Ok(self
            .records
            .conferences_by_organizer(&identity.user_id)
            .await?)
    }

    /// Looks up a conference by its websafe key.
    ///
    /// # Errors
    ///
    /// `NotFound` if the key is malformed or resolves to nothing, `Store` if
    /// the store fails.
    pub async fn get_conference(&self, websafe_key: &str) -> Result<Conference, ConferenceError> {
        let key = ConferenceKey::parse_websafe(websafe_key)
            .map_err(|_| ConferenceError::conference_not_found(websafe_key))?;

        self.records
            .get_conference(&key)
            .await?
            .map(|stored| stored.record)
            .ok_or_else(|| ConferenceError::conference_not_found(websafe_key))
    }

    /// Conferences the caller registered for, in registration order. Keys
    /// that no longer resolve are skipped.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a caller, `Store` if the store fails.
    pub async fn get_conferences_to_attend(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Vec<Conference>, ConferenceError> {
        let identity = require_identity(identity)?;
        let (profile, _) = self.load_profile(identity).await?;
        Ok(self
            .records
            .get_conferences(&profile.conference_keys_to_attend)
            .await?)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Takes a seat at the conference for the caller.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a caller, `NotFound` for an unknown key,
    /// `Conflict` when already registered or the conference is full,
    /// `Forbidden` for any unexpected failure inside the transaction.
    pub async fn register_for_conference(
        &self,
        identity: Option<&Identity>,
        websafe_key: &str,
    ) -> Result<WrappedBoolean, ConferenceError> {
        self.run_registration(identity, websafe_key, RegistrationAction::Register)
            .await
    }

    /// Gives the caller's seat back.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a caller, `NotFound` for an unknown key,
    /// `Conflict` when the caller is not registered, `Forbidden` for any
    /// unexpected failure inside the transaction.
    pub async fn unregister_from_conference(
        &self,
        identity: Option<&Identity>,
        websafe_key: &str,
    ) -> Result<WrappedBoolean, ConferenceError> {
        self.run_registration(identity, websafe_key, RegistrationAction::Unregister)
            .await
    }

    async fn run_registration(
        &self,
        identity: Option<&Identity>,
        websafe_key: &str,
        command: RegistrationAction,
    ) -> Result<WrappedBoolean, ConferenceError> {
        let identity = require_identity(identity)?;

        let result = match ConferenceKey::parse_websafe(websafe_key) {
            Err(_) => Err(RegistrationRejection::ConferenceNotFound(
                websafe_key.to_string(),
            )),
            Ok(key) => {
                let key = &key;
                let command = &command;
                let attempt = retry_with_predicate(
                    self.retry_policy.clone(),
                    move || self.registration_attempt(identity, key, command.clone()),
                    RecordStoreError::is_conflict,
                )
                .await;

                match attempt {
                    Ok(outcome) => outcome.into_result(),
                    Err(error) => Err(RegistrationRejection::Unknown(error.to_string())),
                }
            }
        };

        if let Err(RegistrationRejection::Unknown(detail)) = &result {
            tracing::error!(
                user_id = %identity.user_id,
                conference = websafe_key,
                command = ?command,
                error = %detail,
                "Registration transaction failed"
            );
        }
        metrics::record_registration(outcome_label(&result));

        let wrapped = result?;
        tracing::info!(
            user_id = %identity.user_id,
            conference = websafe_key,
            reason = %wrapped.reason,
            "Registration updated"
        );
        Ok(wrapped)
    }

    /// One read-modify-write cycle over the (conference, profile) pair.
    async fn registration_attempt(
        &self,
        identity: &Identity,
        key: &ConferenceKey,
        command: RegistrationAction,
    ) -> Result<RegistrationOutcome, RecordStoreError> {
        let stored = self.records.get_conference(key).await?;
        let conference_version = stored.as_ref().map(|stored| stored.version);
        let (profile, profile_version) = self.load_profile(identity).await?;

        let store = Store::new(
            RegistrationState::new(key.clone(), stored.map(|stored| stored.record), profile),
            RegistrationReducer::new(),
            RegistrationEnvironment,
        );
        store.send(command).await;

        let (outcome, conference, profile) = store
            .state(|s| (s.last_outcome.clone(), s.conference.clone(), s.profile.clone()))
            .await;
        let outcome = outcome.unwrap_or_else(|| {
            RegistrationOutcome::Rejected(RegistrationRejection::Unknown(
                "registration produced no outcome".to_string(),
            ))
        });

        if outcome.is_change() {
            let Some(conference) = conference else {
                return Ok(RegistrationOutcome::Rejected(RegistrationRejection::Unknown(
                    "registration changed a missing conference".to_string(),
                )));
            };
            self.commit(vec![
                RecordWrite::conference(conference, conference_version),
                RecordWrite::profile(profile, profile_version),
            ])
            .await?;
        }

        Ok(outcome)
    }

    // ========================================================================
    // Announcements & health
    // ========================================================================

    /// The cached announcement, `None` when nothing is cached.
    ///
    /// # Errors
    ///
    /// `Cache` if the cache cannot be reached.
    pub async fn get_announcement(&self) -> Result<Option<Announcement>, ConferenceError> {
        let cached = self.cache.get(ANNOUNCEMENTS_KEY).await?;
        Ok(cached
            .filter(|message| !message.is_empty())
            .map(|message| Announcement { message }))
    }

    /// Checks that the record store is reachable.
    ///
    /// # Errors
    ///
    /// `Store` if it is not.
    pub async fn check_store(&self) -> Result<(), ConferenceError> {
        Ok(self.records.ping().await?)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// The caller's profile and its version; a default profile (and no
    /// version) when none is stored yet.
    async fn load_profile(
        &self,
        identity: &Identity,
    ) -> Result<(Profile, Option<Version>), RecordStoreError> {
        Ok(match self.records.get_profile(&identity.user_id).await? {
            Some(stored) => (stored.record, Some(stored.version)),
            None => (Profile::new_default(identity), None),
        })
    }

    async fn commit(&self, writes: Vec<RecordWrite>) -> Result<(), RecordStoreError> {
        self.records.commit(writes).await.inspect_err(|error| {
            if error.is_conflict() {
                metrics::record_commit_conflict();
                tracing::debug!(error = %error, "Commit lost a version race");
            }
        })
    }
}

fn require_identity(identity: Option<&Identity>) -> Result<&Identity, ConferenceError> {
    identity.ok_or(ConferenceError::Unauthenticated)
}

const fn outcome_label(result: &Result<WrappedBoolean, RegistrationRejection>) -> &'static str {
    match result {
        Ok(_) => "succeeded",
        Err(RegistrationRejection::ConferenceNotFound(_)) => "not_found",
        Err(RegistrationRejection::AlreadyRegistered) => "already_registered",
        Err(RegistrationRejection::NoSeatsAvailable) => "no_seats",
        Err(RegistrationRejection::NotRegistered) => "not_registered",
        Err(RegistrationRejection::Unknown(_)) => "unknown",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use conference_runtime::memory::{
        InMemoryAnnouncementCache, InMemoryRecordStore, InMemoryTaskQueue,
    };

    fn service() -> (ConferenceService, InMemoryAnnouncementCache) {
        let cache = InMemoryAnnouncementCache::new();
        let service = ConferenceService::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(cache.clone()),
            Arc::new(InMemoryTaskQueue::new()),
        );
        (service, cache)
    }

    #[tokio::test]
    async fn anonymous_callers_are_rejected() {
        let (service, _) = service();

        assert_eq!(
            service.get_profile(None).await.unwrap_err(),
            ConferenceError::Unauthenticated
        );
        assert_eq!(
            service
                .register_for_conference(None, "anything")
                .await
                .unwrap_err(),
            ConferenceError::Unauthenticated
        );
    }

    #[tokio::test]
    async fn empty_announcement_counts_as_absent() {
        let (service, cache) = service();
        assert_eq!(service.get_announcement().await.unwrap(), None);

        cache.set(ANNOUNCEMENTS_KEY, "").await;
        assert_eq!(service.get_announcement().await.unwrap(), None);

        cache.set(ANNOUNCEMENTS_KEY, "Last chance to attend! Kickoff").await;
        assert_eq!(
            service.get_announcement().await.unwrap(),
            Some(Announcement {
                message: "Last chance to attend! Kickoff".to_string()
            })
        );
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(
            outcome_label(&Ok(WrappedBoolean::success("Registration successful"))),
            "succeeded"
        );
        assert_eq!(
            outcome_label(&Err(RegistrationRejection::NoSeatsAvailable)),
            "no_seats"
        );
        assert_eq!(
            outcome_label(&Err(RegistrationRejection::Unknown("boom".to_string()))),
            "unknown"
        );
    }
}
