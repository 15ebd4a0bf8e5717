//! # Conference Central Runtime
//!
//! Imperative shell around the functional core.
//!
//! ## Core Components
//!
//! - **Store**: owns a reducer's state for the duration of one operation,
//!   executes the effects the reducer describes and feeds the resulting
//!   actions back in
//! - **Retry**: exponential backoff used for optimistic-concurrency retries
//! - **Memory**: in-process implementations of the record store, the
//!   announcement cache and the task queue
//!
//! ## Example
//!
//! ```ignore
//! use conference_runtime::store::Store;
//!
//! let store = Store::new(CreationState::new(profile), CreationReducer::new(), env);
//!
//! // Reduce now, run effects later (after the records are committed)
//! let effects = store.reduce(CreationAction::CreateConference { id, form }).await;
//! record_store.commit(writes).await?;
//! store.execute(effects).await;
//!
//! let confirmation = store.state(|s| s.confirmation.clone()).await;
//! ```

use conference_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Retry logic with exponential backoff
pub mod retry;

/// In-memory collaborators
pub mod memory;

pub use retry::{retry_with_backoff, retry_with_predicate, RetryPolicy};

/// Store - runtime coordinator for a reducer
pub mod store {
    use super::{Arc, Effect, Reducer, RwLock};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use smallvec::SmallVec;

    /// Effects returned by a reducer
    pub type Effects<A> = SmallVec<[Effect<A>; 4]>;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// Unlike a long-lived actor, a conference `Store` usually lives for a
    /// single operation: the caller reduces a command, persists the result
    /// and only then executes the effects. Execution is awaited, so when
    /// [`Store::execute`] returns every effect (and every effect produced
    /// by feedback actions) has completed.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
            }
        }

        /// Run the reducer for `action` and return its effects unexecuted.
        pub async fn reduce(&self, action: A) -> Effects<A> {
            let mut state = self.state.write().await;
            self.reducer.reduce(&mut state, action, &self.environment)
        }

        /// Reduce `action` and execute the resulting effects to completion.
        pub async fn send(&self, action: A) {
            let effects = self.reduce(action).await;
            self.execute(effects).await;
        }

        /// Execute effects to completion, feeding produced actions back
        /// into the reducer.
        pub async fn execute(&self, effects: Effects<A>) {
            for effect in effects {
                self.execute_effect(effect).await;
            }
        }

        /// Read from the current state
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        fn feedback(&self, action: Option<A>) -> BoxFuture<'_, ()> {
            async move {
                if let Some(action) = action {
                    self.send(action).await;
                }
            }
            .boxed()
        }

        async fn execute_effect(&self, effect: Effect<A>) {
            match effect {
                Effect::EnqueueTask(operation) => {
                    metrics::counter!("store.effects.executed", "type" => "enqueue_task")
                        .increment(1);
                    let url = operation.task.url().to_string();
                    tracing::debug!(task = %url, "Enqueueing task");

                    let action = match operation.task_queue.enqueue(operation.task).await {
                        Ok(()) => {
                            tracing::debug!(task = %url, "Task enqueued");
                            (operation.on_success)(())
                        }
                        Err(error) => {
                            tracing::warn!(task = %url, error = %error, "Failed to enqueue task");
                            (operation.on_error)(error)
                        }
                    };
                    self.feedback(action).await;
                }
            }
        }
    }
}
