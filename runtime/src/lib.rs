//! # Festival Ledger Runtime
//!
//! The Store runtime that owns the ledger state and executes effects.
//!
//! ## Core Components
//!
//! - **Store**: holds the single state value and serializes every mutation
//! - **Effect Executor**: runs effect descriptions on tokio and feeds resulting actions back
//! - **Action broadcast**: lets callers observe outcomes produced by effects
//!
//! ## Update discipline
//!
//! Every action is reduced against a *copy* of the current state. The copy then
//! replaces the stored state wholesale while the write lock is held, so readers only
//! ever observe complete snapshots, never a half-applied batch.
//!
//! ## Example
//!
//! ```ignore
//! use festledger_runtime::Store;
//!
//! let store = Store::new(initial_state, LedgerReducer::new(), environment);
//!
//! // Send an action
//! store.send(LedgerAction::SetLocale { request_id, locale: Locale::De }).await?;
//!
//! // Read state
//! let tickets = store.state(|s| s.tickets.len()).await;
//! ```

use festledger_core::{effect::Effect, reducer::Reducer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. Awaiting it waits for the effects spawned by
/// that one action (for example the snapshot write), not for effects of the
/// actions they feed back.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (handle, _tracking) = Self::new();
        handle
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracker dropped, so nothing is left running
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: counter shared between an [`EffectHandle`] and the tasks it tracks
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counters on drop
///
/// Runs even if the effect future panics.
struct DecrementGuard {
    tracking: EffectTracking,
    pending: Arc<AtomicUsize>,
}

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        self.tracking.decrement();
    }
}

/// Store module - the runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicUsize, DecrementGuard, Duration, Effect, EffectHandle,
        EffectTracking, Ordering, Reducer, RwLock, StoreError,
    };
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`, replaced wholesale on every action)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast here before it is
        /// fed back, so callers can wait for the outcome of a command.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Clone + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast holds 64 undelivered actions per subscriber.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 64)
        }

        /// Create a store with a custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Initiate graceful shutdown
        ///
        /// New actions are rejected; the call returns once every running effect
        /// (including fire-and-forget snapshot writes) has finished.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(20);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running", pending
                    );
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Clones the current state and runs the reducer on the clone
        /// 3. Replaces the stored state with the reduced clone
        /// 4. Spawns the returned effects
        ///
        /// Concurrent `send()` calls serialize on the write lock, so two commands
        /// can never validate against the same stale state.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut current = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let mut next = current.clone();
                let effects = self.reducer.reduce(&mut next, action, &*self.environment);
                *current = next;
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect(effect, &tracking);
            }

            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast *before* sending so the outcome
        /// cannot be missed, then returns the first broadcast action accepted by
        /// `predicate`.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action arrived in time
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged, {} actions skipped", skipped);
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to every action produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let sold = store.state(|s| s.tickets.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Clone of the complete current state
        pub async fn snapshot(&self) -> S {
            self.state(S::clone).await
        }

        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking);
                    }
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    tracking.increment();
                    self.pending_effects.fetch_add(1, Ordering::SeqCst);

                    let guard = DecrementGuard {
                        tracking: tracking.clone(),
                        pending: Arc::clone(&self.pending_effects),
                    };
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, feeding back");

                            // Broadcast to observers first; nobody listening is fine
                            let _ = store.action_broadcast.send(action.clone());

                            if let Err(error) = store.send(action).await {
                                tracing::debug!(%error, "Feedback action dropped");
                            }
                        }
                    });
                },
            }
        }
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
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use festledger_core::{smallvec, SmallVec};

    #[derive(Clone, Debug, Default, PartialEq)]
    struct TallyState {
        admitted: u32,
        capacity: u32,
        history: Vec<u32>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TallyAction {
        Admit(u32),
        Admitted(u32),
        Refused(u32),
    }

    #[derive(Clone)]
    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = TallyState;
        type Action = TallyAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut TallyState,
            action: TallyAction,
            _env: &(),
        ) -> SmallVec<[Effect<TallyAction>; 4]> {
            match action {
                TallyAction::Admit(n) => {
                    if state.admitted + n > state.capacity {
                        return smallvec![Effect::announce(TallyAction::Refused(n))];
                    }
                    state.admitted += n;
                    state.history.push(n);
                    smallvec![Effect::announce(TallyAction::Admitted(n))]
                },
                TallyAction::Admitted(_) | TallyAction::Refused(_) => SmallVec::new(),
            }
        }
    }

    fn store(capacity: u32) -> Store<TallyState, TallyAction, (), TallyReducer> {
        Store::new(
            TallyState {
                capacity,
                ..TallyState::default()
            },
            TallyReducer,
            (),
        )
    }

    #[tokio::test]
    async fn send_replaces_state() {
        let store = store(10);
        let mut handle = store.send(TallyAction::Admit(3)).await.unwrap();
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.state(|s| s.admitted).await, 3);
        assert_eq!(store.snapshot().await.history, vec![3]);
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_outcome() {
        let store = store(5);

        let outcome = store
            .send_and_wait_for(
                TallyAction::Admit(6),
                |a| matches!(a, TallyAction::Admitted(_) | TallyAction::Refused(_)),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(outcome, TallyAction::Refused(6));
        assert_eq!(store.state(|s| s.admitted).await, 0);
    }

    #[tokio::test]
    async fn concurrent_sends_never_exceed_capacity() {
        let store = store(10);

        let tasks: Vec<_> = (0..25)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.send(TallyAction::Admit(1)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.state(|s| s.admitted).await, 10);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = store(10);
        store.send(TallyAction::Admit(1)).await.unwrap();

        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert!(matches!(
            store.send(TallyAction::Admit(1)).await,
            Err(StoreError::ShutdownInProgress)
        ));
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn completed_handle_does_not_block() {
        let mut handle = EffectHandle::completed();
        handle.wait_with_timeout(Duration::from_millis(50)).await.unwrap();
    }
}
