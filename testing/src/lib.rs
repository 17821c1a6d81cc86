//! # Festival Ledger Testing
//!
//! Testing utilities for reducers built on `festledger-core`.
//!
//! This crate provides:
//! - A fixed clock for deterministic timestamps
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Assertion helpers for returned effects
//!
//! ## Example
//!
//! ```ignore
//! use festledger_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(LedgerReducer::new())
//!     .with_env(test_environment())
//!     .given_state(seed_state())
//!     .when_action(LedgerAction::CheckIn { request_id, code: "25-1-000001".into(), gate: None })
//!     .then_state(|state| assert_eq!(state.scans.len(), 1))
//!     .run();
//! ```

pub mod reducer_test;

use chrono::{DateTime, Utc};
use festledger_core::environment::Clock;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::TimeZone;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use festledger_testing::mocks::FixedClock;
    /// use festledger_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Opening night of the festival, 2025-10-16 18:30:00 UTC
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            Utc.with_ymd_and_hms(2025, 10, 16, 18, 30, 0)
                .single()
                .unwrap_or(DateTime::UNIX_EPOCH),
        )
    }
}

pub use mocks::{test_clock, FixedClock};
pub use reducer_test::{assertions, ReducerTest};
