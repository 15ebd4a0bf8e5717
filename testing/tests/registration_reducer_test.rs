//! Registration reducer scenarios.

use conference_core::registration::{
    RegistrationAction, RegistrationEnvironment, RegistrationOutcome, RegistrationReducer,
    RegistrationRejection, RegistrationState,
};
use conference_testing::{assertions, fixtures, ReducerTest};

type RegistrationTest = ReducerTest<
    RegistrationReducer,
    RegistrationState,
    RegistrationAction,
    RegistrationEnvironment,
>;

fn given_seats(seats: u32) -> RegistrationTest {
    ReducerTest::new(RegistrationReducer::new())
        .with_env(RegistrationEnvironment)
        .given_state(fixtures::registration_state(seats))
}

fn seats(state: &RegistrationState) -> Option<u32> {
    state.conference.as_ref().map(|c| c.seats_available)
}

fn rejected(rejection: RegistrationRejection) -> Option<RegistrationOutcome> {
    Some(RegistrationOutcome::Rejected(rejection))
}

#[test]
fn register_books_one_seat() {
    given_seats(2)
        .when_action(RegistrationAction::Register)
        .then_state(|state| {
            assert_eq!(state.last_outcome, Some(RegistrationOutcome::Registered));
            assert_eq!(seats(state), Some(1));
            assert!(state.profile.is_attending(&state.key));
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn register_twice_is_rejected_without_changes() {
    given_seats(2)
        .when_actions([RegistrationAction::Register, RegistrationAction::Register])
        .then_state(|state| {
            assert_eq!(
                state.last_outcome,
                rejected(RegistrationRejection::AlreadyRegistered)
            );
            assert_eq!(seats(state), Some(1));
            assert_eq!(state.profile.conference_keys_to_attend.len(), 1);
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn full_conference_rejects() {
    given_seats(0)
        .when_action(RegistrationAction::Register)
        .then_state(|state| {
            assert_eq!(
                state.last_outcome,
                rejected(RegistrationRejection::NoSeatsAvailable)
            );
            assert_eq!(seats(state), Some(0));
            assert!(!state.profile.is_attending(&state.key));
        })
        .run();
}

#[test]
fn already_registered_is_checked_before_seats() {
    // The single seat goes to the caller, so the retry finds zero seats left
    given_seats(1)
        .when_actions([RegistrationAction::Register, RegistrationAction::Register])
        .then_state(|state| {
            assert_eq!(seats(state), Some(0));
            assert_eq!(
                state.last_outcome,
                rejected(RegistrationRejection::AlreadyRegistered)
            );
        })
        .run();
}

#[test]
fn missing_conference_is_not_found() {
    for action in [RegistrationAction::Register, RegistrationAction::Unregister] {
        let mut state = fixtures::registration_state(1);
        state.conference = None;
        let websafe = state.key.to_websafe();

        ReducerTest::new(RegistrationReducer::new())
            .with_env(RegistrationEnvironment)
            .given_state(state)
            .when_action(action)
            .then_state(move |state| {
                assert_eq!(
                    state.last_outcome,
                    rejected(RegistrationRejection::ConferenceNotFound(websafe))
                );
                assert!(state.profile.conference_keys_to_attend.is_empty());
            })
            .run();
    }
}

#[test]
fn unregister_restores_seat_and_key() {
    given_seats(1)
        .when_actions([RegistrationAction::Register, RegistrationAction::Unregister])
        .then_state(|state| {
            assert_eq!(state.last_outcome, Some(RegistrationOutcome::Unregistered));
            assert_eq!(seats(state), Some(1));
            assert!(state.profile.conference_keys_to_attend.is_empty());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn unregister_without_registration_is_rejected() {
    given_seats(3)
        .when_action(RegistrationAction::Unregister)
        .then_state(|state| {
            assert_eq!(
                state.last_outcome,
                rejected(RegistrationRejection::NotRegistered)
            );
            assert_eq!(seats(state), Some(3));
        })
        .run();
}

#[test]
fn returning_a_seat_beyond_capacity_is_unknown() {
    // Profile lists the conference although every seat is still free
    let mut state = fixtures::registration_state(1);
    state.profile.add_conference_key(state.key.clone());

    ReducerTest::new(RegistrationReducer::new())
        .with_env(RegistrationEnvironment)
        .given_state(state)
        .when_action(RegistrationAction::Unregister)
        .then_state(|state| {
            assert!(matches!(
                state.last_outcome,
                Some(RegistrationOutcome::Rejected(RegistrationRejection::Unknown(_)))
            ));
            assert_eq!(seats(state), Some(1));
            assert!(state.profile.is_attending(&state.key));
        })
        .run();
}
