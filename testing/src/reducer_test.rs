//! Given/when/then harness for reducers.
//!
//! The registration and creation reducers are tested by setting up the
//! records a request would load, feeding one or more actions through the
//! reducer and checking the records and effects afterwards.

#![allow(clippy::module_name_repetitions)]

use conference_core::{effect::Effect, reducer::Reducer, SmallVec};

type StateCheck<S> = Box<dyn FnOnce(&S)>;
type EffectCheck<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Builder describing one reducer scenario.
///
/// Actions run in the order given; effect checks only see what the final
/// action returned.
///
/// ```ignore
/// ReducerTest::new(RegistrationReducer::new())
///     .with_env(RegistrationEnvironment)
///     .given_state(fixtures::registration_state(2))
///     .when_action(RegistrationAction::Register)
///     .then_state(|state| assert_eq!(state.last_outcome, Some(RegistrationOutcome::Registered)))
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    env: Option<E>,
    given: Option<S>,
    actions: Vec<A>,
    state_checks: Vec<StateCheck<S>>,
    effect_checks: Vec<EffectCheck<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Starts a scenario for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            env: None,
            given: None,
            actions: Vec::new(),
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
        }
    }

    /// Environment passed to every `reduce` call
    #[must_use]
    pub fn with_env(self, env: E) -> Self {
        Self { env: Some(env), ..self }
    }

    /// Records before the first action
    #[must_use]
    pub fn given_state(self, state: S) -> Self {
        Self { given: Some(state), ..self }
    }

    /// Appends one action
    #[must_use]
    pub fn when_action(self, action: A) -> Self {
        self.when_actions([action])
    }

    /// Appends actions in order
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Check run against the final state
    #[must_use]
    pub fn then_state(mut self, check: impl FnOnce(&S) + 'static) -> Self {
        self.state_checks.push(Box::new(check));
        self
    }

    /// Check run against the last action's effects
    #[must_use]
    pub fn then_effects(mut self, check: impl FnOnce(&[Effect<A>]) + 'static) -> Self {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Runs the scenario.
    ///
    /// # Panics
    ///
    /// Panics when the state, the environment or every action is missing,
    /// and whenever a check fails.
    #[allow(clippy::panic, clippy::expect_used)] // Test harness
    pub fn run(self) {
        let Self {
            reducer,
            env,
            given,
            actions,
            state_checks,
            effect_checks,
        } = self;

        let env = env.expect("call with_env() before run()");
        let mut state = given.expect("call given_state() before run()");
        assert!(!actions.is_empty(), "call when_action() before run()");

        let effects = actions
            .into_iter()
            .fold(SmallVec::new(), |_, action| reducer.reduce(&mut state, action, &env));

        state_checks.into_iter().for_each(|check| check(&state));
        effect_checks.into_iter().for_each(|check| check(&effects));
    }
}

/// Effect checks shared by reducer tests
pub mod assertions {
    use conference_core::effect::Effect;
    use conference_core::task_queue::Task;

    /// Fails unless the reducer asked for nothing
    ///
    /// # Panics
    ///
    /// Panics when any effect is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.is_empty(),
            "reducer returned {} unexpected effect(s): {effects:?}",
            effects.len()
        );
    }

    /// Fails unless exactly `expected` effects were returned
    ///
    /// # Panics
    ///
    /// Panics on a count mismatch.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(effects.len(), expected, "unexpected effect count");
    }

    /// Returns the single task enqueued by `effects`
    ///
    /// # Panics
    ///
    /// Panics unless exactly one effect enqueues a task.
    #[allow(clippy::panic)] // Test assertion
    pub fn enqueued_task<A>(effects: &[Effect<A>]) -> Task {
        let tasks: Vec<&Task> = effects.iter().filter_map(Effect::enqueued_task).collect();
        match tasks.as_slice() {
            [task] => (*task).clone(),
            other => panic!("Expected exactly one EnqueueTask effect, found {}", other.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use conference_core::registration::{
        RegistrationAction, RegistrationEnvironment, RegistrationOutcome, RegistrationReducer,
    };

    #[test]
    fn actions_apply_in_order() {
        ReducerTest::new(RegistrationReducer::new())
            .with_env(RegistrationEnvironment)
            .given_state(fixtures::registration_state(1))
            .when_actions([RegistrationAction::Register, RegistrationAction::Unregister])
            .then_state(|state| {
                assert_eq!(state.last_outcome, Some(RegistrationOutcome::Unregistered));
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 0))
            .run();
    }

    #[test]
    #[should_panic(expected = "given_state")]
    fn missing_state_is_reported() {
        ReducerTest::new(RegistrationReducer::new())
            .with_env(RegistrationEnvironment)
            .when_action(RegistrationAction::Register)
            .run();
    }
}
