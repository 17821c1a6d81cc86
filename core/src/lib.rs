//! # Festival Ledger Core
//!
//! Core traits and types for the festival ledger.
//!
//! Every mutation of the ledger flows through a single reducer:
//!
//! - **State**: the complete ledger aggregate (tickets, shows, sales, ...)
//! - **Action**: commands issued by operators plus the outcome events they produce
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a description of side work (persisting a snapshot, announcing an outcome)
//! - **Environment**: injected dependencies such as the clock and the snapshot store
//!
//! The reducer never performs I/O itself. It validates a command against the
//! current state, mutates the state and hands back effects for the runtime to run.
//!
//! ## Example
//!
//! ```ignore
//! use festledger_core::*;
//!
//! impl Reducer for LedgerReducer {
//!     type State = LedgerState;
//!     type Action = LedgerAction;
//!     type Environment = LedgerEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut LedgerState,
//!         action: LedgerAction,
//!         env: &LedgerEnvironment,
//!     ) -> SmallVec<[Effect<LedgerAction>; 4]> {
//!         // Business logic goes here
//!         SmallVec::new()
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Reducer module - the single place where business rules mutate state
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// Most reducers produce zero, one or two effects, so effects are returned
    /// inline in a `SmallVec` to avoid a heap allocation per action.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// 1. Validates the action against `state`
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed by the runtime
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values, not execution. The runtime decides when and where they run.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are returned from reducers and
    /// executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is broadcast to observers
        /// and fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Wrap an async block as an effect
        #[must_use]
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// An effect that immediately yields `action` back to the runtime
        #[must_use]
        pub fn announce(action: Action) -> Effect<Action>
        where
            Action: Send + 'static,
        {
            Effect::future(async move { Some(action) })
        }
    }
}

/// Environment module - dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;

        /// Wall-clock time at the festival site
        ///
        /// Tickets, sales and scans record local dates and times, so the
        /// configured site offset is applied here rather than at every call site.
        fn local_now(&self, offset: FixedOffset) -> NaiveDateTime {
            self.now().with_timezone(&offset).naive_local()
        }
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
