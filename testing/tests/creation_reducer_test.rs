//! Conference creation reducer scenarios.

#![allow(clippy::expect_used)] // Test code

use conference_core::creation::{
    ConfirmationStatus, CreationAction, CreationEnvironment, CreationReducer, CreationState,
};
use conference_core::task_queue::CONFIRMATION_EMAIL_PATH;
use conference_core::types::{ConferenceForm, ConferenceId, Profile};
use conference_runtime::memory::InMemoryTaskQueue;
use conference_testing::{assertions, fixtures, ReducerTest};
use std::sync::Arc;

type CreationTest =
    ReducerTest<CreationReducer, CreationState, CreationAction, CreationEnvironment>;

fn given_organizer() -> CreationTest {
    ReducerTest::new(CreationReducer::new())
        .with_env(CreationEnvironment::new(Arc::new(InMemoryTaskQueue::new())))
        .given_state(CreationState::new(Profile::new_default(&fixtures::organizer())))
}

#[test]
fn create_builds_conference_and_requests_confirmation() {
    let id = ConferenceId::new();

    given_organizer()
        .when_action(CreationAction::CreateConference {
            id,
            form: fixtures::conference_form("RustConf", 300),
        })
        .then_state(move |state| {
            let conference = state.conference.as_ref().expect("conference created");
            assert_eq!(conference.key.id(), id);
            assert_eq!(conference.organizer_user_id().as_str(), "organizer-1");
            assert_eq!(conference.seats_available, 300);
            assert_eq!(conference.month, 6);
            assert_eq!(state.confirmation, ConfirmationStatus::Pending);
            assert!(state.last_error.is_none());
        })
        .then_effects(|effects| {
            assertions::assert_effects_count(effects, 1);
            let task = assertions::enqueued_task(effects);
            assert_eq!(task.url(), CONFIRMATION_EMAIL_PATH);
            assert_eq!(task.get_param("email"), Some("organizer@example.com"));
            assert!(task
                .get_param("conferenceInfo")
                .is_some_and(|info| info.contains("Name: RustConf")));
        })
        .run();
}

#[test]
fn invalid_form_produces_no_effects() {
    given_organizer()
        .when_action(CreationAction::CreateConference {
            id: ConferenceId::new(),
            form: ConferenceForm::default(),
        })
        .then_state(|state| {
            assert!(state.conference.is_none());
            assert_eq!(state.confirmation, ConfirmationStatus::NotRequested);
            assert!(state.last_error.is_some());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn second_create_in_one_request_is_rejected() {
    given_organizer()
        .when_actions([
            CreationAction::CreateConference {
                id: ConferenceId::new(),
                form: fixtures::conference_form("First", 10),
            },
            CreationAction::CreateConference {
                id: ConferenceId::new(),
                form: fixtures::conference_form("Second", 10),
            },
        ])
        .then_state(|state| {
            assert_eq!(
                state.conference.as_ref().map(|c| c.name.as_str()),
                Some("First")
            );
            assert!(state.last_error.is_some());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn confirmation_feedback_updates_status() {
    given_organizer()
        .when_action(CreationAction::ConfirmationQueued)
        .then_state(|state| assert_eq!(state.confirmation, ConfirmationStatus::Queued))
        .run();

    given_organizer()
        .when_action(CreationAction::ConfirmationFailed {
            error: "down".to_string(),
        })
        .then_state(|state| {
            assert_eq!(
                state.confirmation,
                ConfirmationStatus::Failed("down".to_string())
            );
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}
