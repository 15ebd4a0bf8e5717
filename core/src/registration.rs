//! Seat registration for a single (profile, conference) pair.
//!
//! The reducer decides whether a caller may register for (or unregister
//! from) a conference and applies the change to an in-memory copy of both
//! records. Loading those records, committing them atomically and retrying
//! on version conflicts is the job of the calling service.
//!
//! Per pair the state machine is `not-registered <-> registered`:
//! `Register` takes one seat, `Unregister` gives one back. A command issued
//! from the wrong state is rejected and leaves both records untouched.

use crate::effect::Effect;
use crate::error::ConferenceError;
use crate::reducer::Reducer;
use crate::types::{Conference, ConferenceKey, Profile, WrappedBoolean};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

// ============================================================================
// Outcomes
// ============================================================================

/// Why a registration command was refused
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationRejection {
    /// The key does not resolve to a conference
    #[error("No Conference found with key: {0}")]
    ConferenceNotFound(String),

    /// The profile already lists the conference
    #[error("Already registered")]
    AlreadyRegistered,

    /// Every seat is taken
    #[error("No seats available")]
    NoSeatsAvailable,

    /// The profile does not list the conference
    #[error("User not registered")]
    NotRegistered,

    /// Anything else that went wrong inside the transaction. The detail is
    /// for logs only and never reaches the caller.
    #[error("Unknown exception")]
    Unknown(String),
}

impl RegistrationRejection {
    /// The `{result: false, reason}` form of this rejection
    #[must_use]
    pub fn to_wrapped(&self) -> WrappedBoolean {
        WrappedBoolean::failure(self.to_string())
    }
}

impl From<RegistrationRejection> for ConferenceError {
    fn from(rejection: RegistrationRejection) -> Self {
        match rejection {
            RegistrationRejection::ConferenceNotFound(key) => Self::conference_not_found(&key),
            RegistrationRejection::AlreadyRegistered => {
                Self::Conflict("You have already registered".to_string())
            }
            RegistrationRejection::NoSeatsAvailable => {
                Self::Conflict("There are no seats available".to_string())
            }
            RegistrationRejection::NotRegistered => {
                Self::Conflict("You have not registered yet".to_string())
            }
            RegistrationRejection::Unknown(_) => Self::Forbidden("Unknown exception".to_string()),
        }
    }
}

/// Result of the last command the reducer processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// A seat was booked
    Registered,
    /// A seat was returned
    Unregistered,
    /// The command was refused; nothing changed
    Rejected(RegistrationRejection),
}

impl RegistrationOutcome {
    /// Whether the records were modified and must be committed
    #[must_use]
    pub const fn is_change(&self) -> bool {
        matches!(self, Self::Registered | Self::Unregistered)
    }

    /// Converts the outcome into the value returned to callers
    ///
    /// # Errors
    ///
    /// Returns the rejection when the command was refused.
    pub fn into_result(self) -> Result<WrappedBoolean, RegistrationRejection> {
        match self {
            Self::Registered => Ok(WrappedBoolean::success("Registration successful")),
            Self::Unregistered => Ok(WrappedBoolean::success("Un-registration successful")),
            Self::Rejected(rejection) => Err(rejection),
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// In-memory copy of the two records a registration touches
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationState {
    /// Conference the command targets
    pub key: ConferenceKey,
    /// The conference, `None` when the key did not resolve
    pub conference: Option<Conference>,
    /// The caller's profile (stored or freshly defaulted)
    pub profile: Profile,
    /// Outcome of the last processed command
    pub last_outcome: Option<RegistrationOutcome>,
}

impl RegistrationState {
    /// Creates a new `RegistrationState`
    #[must_use]
    pub const fn new(key: ConferenceKey, conference: Option<Conference>, profile: Profile) -> Self {
        Self {
            key,
            conference,
            profile,
            last_outcome: None,
        }
    }
}

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the registration reducer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationAction {
    // Commands
    /// Take a seat at the conference
    Register,
    /// Give the seat back
    Unregister,

    // Events
    /// A seat was booked for the caller
    SeatBooked,
    /// The caller's seat was returned
    SeatReturned,
    /// The command was refused
    Rejected {
        /// Why
        rejection: RegistrationRejection,
    },
}

// ============================================================================
// Environment
// ============================================================================

/// Registration has no collaborators: the service hands the reducer fully
/// loaded records and persists the result itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistrationEnvironment;

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for seat registration
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistrationReducer;

impl RegistrationReducer {
    /// Creates a new `RegistrationReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates `Register`; checks run in a fixed order
    fn validate_register(state: &RegistrationState) -> Result<(), RegistrationRejection> {
        let conference = Self::require_conference(state)?;

        if state.profile.is_attending(&state.key) {
            return Err(RegistrationRejection::AlreadyRegistered);
        }

        if conference.seats_available == 0 {
            return Err(RegistrationRejection::NoSeatsAvailable);
        }

        Ok(())
    }

    /// Validates `Unregister`
    fn validate_unregister(state: &RegistrationState) -> Result<(), RegistrationRejection> {
        Self::require_conference(state)?;

        if !state.profile.is_attending(&state.key) {
            return Err(RegistrationRejection::NotRegistered);
        }

        Ok(())
    }

    fn require_conference(state: &RegistrationState) -> Result<&Conference, RegistrationRejection> {
        state
            .conference
            .as_ref()
            .ok_or_else(|| RegistrationRejection::ConferenceNotFound(state.key.to_websafe()))
    }

    /// Applies an event to state
    fn apply_event(state: &mut RegistrationState, action: &RegistrationAction) {
        match action {
            RegistrationAction::SeatBooked => {
                let booked = state
                    .conference
                    .as_mut()
                    .map(|conference| conference.book_seats(1));
                match booked {
                    Some(Ok(())) => {
                        state.profile.add_conference_key(state.key.clone());
                        state.last_outcome = Some(RegistrationOutcome::Registered);
                    }
                    Some(Err(error)) => {
                        Self::reject(state, RegistrationRejection::Unknown(error.to_string()));
                    }
                    None => {
                        let websafe = state.key.to_websafe();
                        Self::reject(state, RegistrationRejection::ConferenceNotFound(websafe));
                    }
                }
            }
            RegistrationAction::SeatReturned => {
                let returned = state
                    .conference
                    .as_mut()
                    .map(|conference| conference.give_back_seats(1));
                match returned {
                    Some(Ok(())) => {
                        state.profile.remove_conference_key(&state.key);
                        state.last_outcome = Some(RegistrationOutcome::Unregistered);
                    }
                    Some(Err(error)) => {
                        Self::reject(state, RegistrationRejection::Unknown(error.to_string()));
                    }
                    None => {
                        let websafe = state.key.to_websafe();
                        Self::reject(state, RegistrationRejection::ConferenceNotFound(websafe));
                    }
                }
            }
            RegistrationAction::Rejected { rejection } => {
                Self::reject(state, rejection.clone());
            }
            // Commands don't modify state
            RegistrationAction::Register | RegistrationAction::Unregister => {}
        }
    }

    fn reject(state: &mut RegistrationState, rejection: RegistrationRejection) {
        state.last_outcome = Some(RegistrationOutcome::Rejected(rejection));
    }
}

impl Reducer for RegistrationReducer {
    type State = RegistrationState;
    type Action = RegistrationAction;
    type Environment = RegistrationEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let event = match action {
            // ========== Commands ==========
            RegistrationAction::Register => match Self::validate_register(state) {
                Ok(()) => RegistrationAction::SeatBooked,
                Err(rejection) => RegistrationAction::Rejected { rejection },
            },
            RegistrationAction::Unregister => match Self::validate_unregister(state) {
                Ok(()) => RegistrationAction::SeatReturned,
                Err(rejection) => RegistrationAction::Rejected { rejection },
            },

            // ========== Events ==========
            event => event,
        };

        Self::apply_event(state, &event);

        // Persistence is driven by the caller through the record store
        SmallVec::new()
    }
}
