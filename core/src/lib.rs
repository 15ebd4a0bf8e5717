//! # Conference Central Core
//!
//! Functional core of the Conference Central backend.
//!
//! Conference Central lets users keep a profile, organize conferences, query
//! them, register for seats and read a cached announcement. This crate holds
//! everything that can be decided without performing I/O:
//!
//! - **Domain records**: [`types::Profile`], [`types::Conference`] and the
//!   identifiers and forms around them
//! - **Reducers**: pure `(State, Action, Environment) → (State, Effects)`
//!   functions for seat registration and conference creation
//! - **Query translation**: the filter form to predicate/sort-order compiler
//! - **Collaborator traits**: [`record_store::RecordStore`],
//!   [`cache::AnnouncementCache`] and [`task_queue::TaskQueue`], implemented
//!   by the runtime and adapter crates
//! - **Error taxonomy**: [`error::ConferenceError`]
//!
//! The shell around it (`conference-runtime`, the storage adapters and the
//! HTTP crate) loads records, runs a reducer through a store, commits the
//! result and executes the returned effects.

pub use chrono::{DateTime, NaiveDate, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

pub mod cache;
pub mod creation;
pub mod effect_macros;
pub mod error;
pub mod query;
pub mod record_store;
pub mod registration;
pub mod task_queue;
pub mod types;

/// The reducer trait.
///
/// Seat registration and conference creation are both written as reducers:
/// given the records loaded for one request, an action and an environment,
/// they mutate the records in place and describe any follow-up work as
/// [`Effect`](effect::Effect) values. Nothing in a reducer touches storage.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Decides how an action changes a piece of state.
    ///
    /// ```ignore
    /// let mut state = RegistrationState::new(key, Some(conference), profile);
    /// let effects = RegistrationReducer::new().reduce(
    ///     &mut state,
    ///     RegistrationAction::Register,
    ///     &RegistrationEnvironment,
    /// );
    /// assert_eq!(state.last_outcome, Some(RegistrationOutcome::Registered));
    /// assert!(effects.is_empty());
    /// ```
    pub trait Reducer {
        /// Records the reducer reads and writes
        type State;

        /// Commands and feedback the reducer accepts
        type Action;

        /// Injected collaborators, such as the task queue
        type Environment;

        /// Applies `action` to `state` and returns the effects to run.
        ///
        /// Refused actions leave `state` untouched apart from the recorded
        /// outcome. Reducers here emit at most one effect per action, so
        /// the inline capacity of four never spills to the heap.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effects returned by reducers and executed by the runtime store.
pub mod effect {
    use crate::task_queue::{Task, TaskQueue, TaskQueueError};
    use std::sync::Arc;

    /// Payload of [`Effect::EnqueueTask`].
    ///
    /// Exactly one of the callbacks runs once the queue answers; its action
    /// (if any) goes back through the reducer, which is how conference
    /// creation learns whether the confirmation email was queued.
    pub struct TaskQueueOperation<Action> {
        /// Queue the task is pushed onto
        pub task_queue: Arc<dyn TaskQueue>,
        /// The task to enqueue
        pub task: Task,
        /// Feedback after a successful enqueue
        pub on_success: Box<dyn FnOnce(()) -> Option<Action> + Send>,
        /// Feedback after a failed enqueue
        pub on_error: Box<dyn FnOnce(TaskQueueError) -> Option<Action> + Send>,
    }

    /// Work a reducer asks the runtime to do after the state change.
    ///
    /// Registration finishes entirely inside the reducer; creation hands
    /// the confirmation email to the task queue.
    pub enum Effect<Action> {
        /// Hand a task to the background task queue
        EnqueueTask(TaskQueueOperation<Action>),
    }

    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::EnqueueTask(operation) => f
                    .debug_struct("EnqueueTask")
                    .field("task", &operation.task)
                    .finish_non_exhaustive(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// The task an [`Effect::EnqueueTask`] carries
        #[must_use]
        pub const fn enqueued_task(&self) -> Option<&Task> {
            match self {
                Self::EnqueueTask(operation) => Some(&operation.task),
            }
        }
    }
}
