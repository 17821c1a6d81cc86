//! Ergonomic testing utilities for reducers
//!
//! A fluent Given-When-Then API: seed a state, send one action, then assert on
//! the resulting state and the effects the reducer asked for.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use festledger_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// ReducerTest::new(LedgerReducer::new())
///     .with_env(test_environment())
///     .given_state(seed_state())
///     .when_action(sell(show_id, 2))
///     .then_state(|state| assert_eq!(state.tickets.len(), 2))
///     .then_effects(|effects| assertions::assert_effects_count(effects, 2))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::expect_used)] // Test harness reports misuse loudly
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let effects = self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use festledger_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use festledger_core::{smallvec, SmallVec};

    #[derive(Clone, Debug)]
    struct DoorState {
        inside: u32,
    }

    #[derive(Clone, Debug)]
    enum DoorAction {
        Enter,
        Leave,
        Announce,
    }

    struct DoorReducer;

    struct DoorEnv;

    impl Reducer for DoorReducer {
        type State = DoorState;
        type Action = DoorAction;
        type Environment = DoorEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                DoorAction::Enter => {
                    state.inside += 1;
                    SmallVec::new()
                },
                DoorAction::Leave => {
                    state.inside = state.inside.saturating_sub(1);
                    smallvec![Effect::None]
                },
                DoorAction::Announce => smallvec![Effect::announce(DoorAction::Enter)],
            }
        }
    }

    #[test]
    fn test_reducer_test_enter() {
        ReducerTest::new(DoorReducer)
            .with_env(DoorEnv)
            .given_state(DoorState { inside: 0 })
            .when_action(DoorAction::Enter)
            .then_state(|state| {
                assert_eq!(state.inside, 1);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_reducer_test_leave_saturates() {
        ReducerTest::new(DoorReducer)
            .with_env(DoorEnv)
            .given_state(DoorState { inside: 0 })
            .when_action(DoorAction::Leave)
            .then_state(|state| {
                assert_eq!(state.inside, 0);
            })
            .run();
    }

    #[test]
    fn test_future_effect_assertion() {
        ReducerTest::new(DoorReducer)
            .with_env(DoorEnv)
            .given_state(DoorState { inside: 0 })
            .when_action(DoorAction::Announce)
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }
}
