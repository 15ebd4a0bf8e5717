//! Conference creation.
//!
//! Validates a [`ConferenceForm`], builds the new [`Conference`] under the
//! organizer's key and describes the follow-up work: a confirmation email
//! task for the organizer. The returned effect must only be run once the new
//! records have been committed.

use crate::effect::Effect;
use crate::enqueue_task;
use crate::reducer::Reducer;
use crate::task_queue::{Task, TaskQueue};
use crate::types::{Conference, ConferenceForm, ConferenceId, ConferenceKey, Profile};
use smallvec::{smallvec, SmallVec};
use std::sync::Arc;

// ============================================================================
// State
// ============================================================================

/// Progress of the confirmation email task
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// No conference created yet
    #[default]
    NotRequested,
    /// Task described, waiting for the runtime
    Pending,
    /// Task accepted by the queue
    Queued,
    /// Queue rejected the task
    Failed(String),
}

/// State of a single creation request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreationState {
    /// The organizer's profile (stored or freshly defaulted)
    pub organizer: Profile,
    /// The created conference
    pub conference: Option<Conference>,
    /// Last validation error
    pub last_error: Option<String>,
    /// Confirmation email progress
    pub confirmation: ConfirmationStatus,
}

impl CreationState {
    /// Creates a new `CreationState` for `organizer`
    #[must_use]
    pub const fn new(organizer: Profile) -> Self {
        Self {
            organizer,
            conference: None,
            last_error: None,
            confirmation: ConfirmationStatus::NotRequested,
        }
    }
}

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the creation reducer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreationAction {
    // Commands
    /// Create a conference with a pre-allocated id
    CreateConference {
        /// Id of the new conference
        id: ConferenceId,
        /// Submitted form
        form: ConferenceForm,
    },

    // Events
    /// The conference was built
    ConferenceCreated {
        /// New conference
        conference: Conference,
    },
    /// The form was rejected
    ValidationFailed {
        /// Reason
        error: String,
    },
    /// The confirmation task was accepted by the queue
    ConfirmationQueued,
    /// The confirmation task could not be enqueued
    ConfirmationFailed {
        /// Reason
        error: String,
    },
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for conference creation
#[derive(Clone)]
pub struct CreationEnvironment {
    /// Queue receiving the confirmation email task
    pub task_queue: Arc<dyn TaskQueue>,
}

impl CreationEnvironment {
    /// Creates a new `CreationEnvironment`
    #[must_use]
    pub fn new(task_queue: Arc<dyn TaskQueue>) -> Self {
        Self { task_queue }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for conference creation
#[derive(Clone, Copy, Debug, Default)]
pub struct CreationReducer;

impl CreationReducer {
    /// Creates a new `CreationReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn validate_create(state: &CreationState, form: &ConferenceForm) -> Result<(), String> {
        if state.conference.is_some() {
            return Err("Conference already created for this request".to_string());
        }
        form.validate()
    }

    /// Applies an event to state
    fn apply_event(state: &mut CreationState, action: &CreationAction) {
        match action {
            CreationAction::ConferenceCreated { conference } => {
                state.conference = Some(conference.clone());
                state.confirmation = ConfirmationStatus::Pending;
                state.last_error = None;
            }
            CreationAction::ValidationFailed { error } => {
                state.last_error = Some(error.clone());
            }
            CreationAction::ConfirmationQueued => {
                state.confirmation = ConfirmationStatus::Queued;
            }
            CreationAction::ConfirmationFailed { error } => {
                state.confirmation = ConfirmationStatus::Failed(error.clone());
            }
            // Commands don't modify state
            CreationAction::CreateConference { .. } => {}
        }
    }
}

impl Reducer for CreationReducer {
    type State = CreationState;
    type Action = CreationAction;
    type Environment = CreationEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            CreationAction::CreateConference { id, form } => {
                if let Err(error) = Self::validate_create(state, &form) {
                    Self::apply_event(state, &CreationAction::ValidationFailed { error });
                    return SmallVec::new();
                }

                let key = ConferenceKey::new(state.organizer.user_id.clone(), id);
                let conference = Conference::from_form(key, form);
                let task = Task::confirmation_email(&state.organizer.main_email, &conference);

                Self::apply_event(state, &CreationAction::ConferenceCreated { conference });

                smallvec![enqueue_task! {
                    queue: env.task_queue,
                    task: task,
                    on_success: || Some(CreationAction::ConfirmationQueued),
                    on_error: |error| Some(CreationAction::ConfirmationFailed {
                        error: error.to_string()
                    })
                }]
            }

            // ========== Events ==========
            event => {
                Self::apply_event(state, &event);
                SmallVec::new()
            }
        }
    }
}
