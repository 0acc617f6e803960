//! # Catalog Runtime
//!
//! Runtime implementation for the catalog state-management pipeline.
//!
//! This crate provides the Store that coordinates reducer execution and
//! effect handling.
//!
//! ## Core Components
//!
//! - **Store**: owns the state document and serializes every reducer call
//! - **Effect Executor**: runs effect descriptions and feeds actions back
//! - **Keyed effects**: switch (latest wins) and exhaust (first wins) policies
//!
//! ## Example
//!
//! ```ignore
//! use catalog_runtime::Store;
//!
//! let store = Store::new(ProductsState::default(), ProductsReducer::new(), env);
//!
//! // Send an action
//! store.send(ProductsAction::LoadProducts).await?;
//!
//! // Read state
//! let loading = store.state(|s| s.loading).await;
//! ```

use catalog_core::{effect::Effect, reducer::Reducer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, RwLock};

/// Switch / exhaust bookkeeping for keyed effects
pub mod keyed;

pub use error::StoreError;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
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

/// Configuration for Store behavior
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// let store = Store::with_config(state, reducer, env, config);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the broadcast channel carrying effect-produced actions
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Effect tracking mode - controls how effects are tracked for completion
///
/// # Modes
///
/// - **Direct**: Tracks only immediate effects (default)
/// - **Cascading**: Tracks effects transitively, following the entire effect tree
#[derive(Debug, Clone)]
pub enum TrackingMode {
    /// Track only immediate effects spawned by this action
    Direct,

    /// Track effects transitively - any effects produced by feedback actions
    /// are also tracked as children
    Cascading {
        /// Child effect handles that need to complete before this handle is done
        children: Arc<Mutex<Vec<EffectHandle>>>,
    },
}

impl TrackingMode {
    /// Create a cascading mode with no children yet
    #[must_use]
    pub fn cascading() -> Self {
        Self::Cascading {
            children: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for effects to complete.
/// Each action gets a handle that can be awaited to know when its effects
/// (and optionally cascading effects) are done.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    mode: TrackingMode,
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle with the given tracking mode
    ///
    /// Returns the caller-facing handle and the internal tracking context.
    fn new(mode: TrackingMode) -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            mode: mode.clone(),
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            mode,
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            mode: TrackingMode::Direct,
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running for this handle
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    ///
    /// # Panics
    ///
    /// Panics if the mutex protecting cascading children is poisoned.
    #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every sender is gone, so no effect can still be running
                break;
            }
        }

        if let TrackingMode::Cascading { children } = &self.mode {
            loop {
                let handles = {
                    let mut guard = children.lock().unwrap();
                    if guard.is_empty() {
                        break;
                    }
                    guard.drain(..).collect::<Vec<_>>()
                };

                for mut handle in handles {
                    Box::pin(handle.wait()).await;
                }
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    ///
    /// # Panics
    ///
    /// Panics if the mutex protecting cascading children is poisoned (via `wait()`).
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("mode", &self.mode)
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    mode: TrackingMode,
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }

    /// Register a feedback action's handle as a child (cascading mode only)
    #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable
    fn adopt(&self, child: EffectHandle) {
        if let TrackingMode::Cascading { children } = &self.mode {
            children.lock().unwrap().push(child);
        }
    }

    /// Tracking mode for actions fed back from this context's effects
    fn feedback_mode(&self) -> TrackingMode {
        match self.mode {
            TrackingMode::Direct => TrackingMode::Direct,
            TrackingMode::Cascading { .. } => TrackingMode::cascading(),
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect
/// panics or is aborted by a newer switch effect.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::keyed::{Admission, KeyedEffects, Ticket, TicketGuard};
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreConfig, StoreError,
        TrackingMode,
    };
    use std::future::Future;
    use std::pin::Pin;
    use tokio::sync::broadcast;

    /// Boxed future yielding an optional feedback action
    type ActionFuture<A> = Pin<Box<dyn Future<Output = Option<A>> + Send>>;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (an `Arc` snapshot behind a `RwLock`, replaced copy-on-write)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and keyed concurrency)
    ///
    /// Reducer calls are serialized by the write lock. Keyed effects are
    /// admitted and their results applied under that same lock, so a
    /// superseded result can never slip in after a newer request.
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
        state: Arc<RwLock<Arc<S>>>,
        reducer: R,
        environment: E,
        keyed: KeyedEffects,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        config: StoreConfig,
        /// Every action produced by effects is broadcast here after it has
        /// been reduced, which enables request-response callers.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + std::fmt::Debug + 'static,
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default()`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(Arc::new(initial_state))),
                reducer,
                environment,
                keyed: KeyedEffects::new(),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                config,
                action_broadcast,
            }
        }

        /// The configuration this store was built with
        #[must_use]
        pub const fn config(&self) -> &StoreConfig {
            &self.config
        }

        /// The injected environment
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// Initiate graceful shutdown of the store
        ///
        /// Sets the shutdown flag (rejecting new actions) and waits for
        /// pending effects to complete.
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
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
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

                tracing::debug!(
                    pending_effects = pending,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Waiting for effects to complete"
                );

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Whether `shutdown` has been initiated
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.shutdown.load(Ordering::Acquire)
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer on a working copy of the current snapshot
        /// 3. Publishes the copy as the new snapshot if it differs
        /// 4. Starts the returned effects (keyed effects are admitted here)
        ///
        /// Returns after effects have been started, not completed.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            self.send_internal(action, TrackingMode::Direct).await
        }

        /// Send an action and track every effect it transitively causes
        ///
        /// Waiting on the returned handle waits for the action's effects and
        /// for the effects of the actions they feed back.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        pub async fn send_cascading(&self, action: A) -> Result<EffectHandle, StoreError> {
            self.send_internal(action, TrackingMode::cascading()).await
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast before sending, then waits for
        /// the first effect-produced action matching the predicate. The state
        /// already reflects that action when it is returned, and the effects it
        /// caused in turn have finished. Both waits share `timeout`.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe BEFORE sending to avoid race condition
            let mut rx = self.action_broadcast.subscribe();

            let mut handle = self.send_cascading(action).await?;

            tokio::time::timeout(timeout, async {
                let matched = loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => break action,
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                skipped,
                                "Action observer lagged, {} actions skipped",
                                skipped
                            );
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                };
                handle.wait().await;
                Ok(matched)
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Actions sent directly via `send` are not broadcast.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.products.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// The current state snapshot
        ///
        /// Snapshots are immutable; a snapshot is pointer-identical to the
        /// previous one exactly when no action changed the state in between.
        pub async fn snapshot(&self) -> Arc<S> {
            Arc::clone(&*self.state.read().await)
        }

        #[tracing::instrument(skip(self, action, tracking_mode), name = "store_send_internal")]
        async fn send_internal(
            &self,
            action: A,
            tracking_mode: TrackingMode,
        ) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            let (handle, tracking) = EffectHandle::new(tracking_mode);

            let mut state = self.state.write().await;
            tracing::trace!("Acquired write lock on state");
            self.dispatch_locked(&mut state, action, &tracking);

            Ok(handle)
        }

        /// Run the reducer and start its effects; caller holds the write lock
        fn dispatch_locked(&self, current: &mut Arc<S>, action: A, tracking: &EffectTracking) {
            tracing::debug!(?action, "Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let effects = {
                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let mut next = S::clone(&**current);
                let effects = self.reducer.reduce(&mut next, action, &self.environment);
                if next != **current {
                    *current = Arc::new(next);
                }
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect_internal(effect, tracking.clone());
            }
        }

        /// Reduce an action produced by an effect and broadcast it
        async fn feed_back(&self, action: A, tracking: &EffectTracking) {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::debug!("Dropping feedback action: store is shutting down");
                return;
            }

            let (child, child_tracking) = EffectHandle::new(tracking.feedback_mode());
            {
                let mut state = self.state.write().await;
                self.dispatch_locked(&mut state, action.clone(), &child_tracking);
            }
            tracking.adopt(child);

            let _ = self.action_broadcast.send(action);
        }

        /// Apply a keyed effect's result if its ticket is still current
        async fn finish_keyed(&self, ticket: Ticket, action: Option<A>, tracking: &EffectTracking) {
            let (child, child_tracking) = EffectHandle::new(tracking.feedback_mode());
            let applied = {
                let mut state = self.state.write().await;

                if !self.keyed.finish(&ticket) {
                    tracing::debug!(
                        effect = %ticket.id(),
                        generation = ticket.generation(),
                        "Discarding result of superseded effect"
                    );
                    return;
                }

                match action {
                    Some(action) if !self.shutdown.load(Ordering::Acquire) => {
                        self.dispatch_locked(&mut state, action.clone(), &child_tracking);
                        Some(action)
                    },
                    _ => None,
                }
            };

            if let Some(action) = applied {
                tracking.adopt(child);
                let _ = self.action_broadcast.send(action);
            }
        }

        /// Spawn a tracked task running `work`
        fn spawn_tracked<F>(&self, tracking: &EffectTracking, work: F) -> tokio::task::AbortHandle
        where
            F: Future<Output = ()> + Send + 'static,
        {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
            let guard = DecrementGuard(tracking.clone());

            let task = tokio::spawn(async move {
                let _guard = guard;
                let _pending_guard = pending_guard;
                work.await;
            });
            task.abort_handle()
        }

        /// Start a keyed effect under its concurrency policy
        fn execute_keyed(
            &self,
            id: &catalog_core::effect::EffectId,
            policy: catalog_core::effect::Concurrency,
            effect: Effect<A>,
            tracking: EffectTracking,
        ) {
            let fut: ActionFuture<A> = match effect {
                Effect::None => return,
                Effect::Future(fut) => fut,
                other => {
                    tracing::warn!(
                        effect = %id,
                        "Concurrency policy only applies to future effects; running unkeyed"
                    );
                    self.execute_effect_internal(other, tracking);
                    return;
                },
            };

            let ticket = match self.keyed.admit(id, policy) {
                Admission::Ignored => {
                    tracing::debug!(effect = %id, "Ignoring effect: one is already in flight");
                    metrics::counter!("store.effects.ignored").increment(1);
                    return;
                },
                Admission::Superseded(ticket) => {
                    tracing::debug!(effect = %id, "Superseding in-flight effect");
                    metrics::counter!("store.effects.superseded").increment(1);
                    ticket
                },
                Admission::Start(ticket) => ticket,
            };

            let store = self.clone();
            let keyed = self.keyed.clone();
            let task_ticket = ticket.clone();
            let task_tracking = tracking.clone();

            let abort = self.spawn_tracked(&tracking, async move {
                let mut ticket_guard = TicketGuard::new(keyed, task_ticket);
                let action = fut.await;
                if let Some(ticket) = ticket_guard.disarm() {
                    store.finish_keyed(ticket, action, &task_tracking).await;
                }
            });

            self.keyed.attach(&ticket, abort);
        }

        /// Execute an effect with tracking
        ///
        /// # Effect Types
        ///
        /// - `None`: No-op
        /// - `Future`: Executes async computation, feeds resulting action back if `Some`
        /// - `Keyed`: Applies the switch/exhaust policy, then runs the inner effect
        ///
        /// Effect task panics are isolated in their task; the [`DecrementGuard`]
        /// keeps the counters accurate.
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into tasks
        fn execute_effect_internal(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);

                    let store = self.clone();
                    let task_tracking = tracking.clone();
                    let _ = self.spawn_tracked(&tracking, async move {
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            store.feed_back(action, &task_tracking).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    });
                },
                Effect::Keyed { id, policy, effect } => {
                    tracing::trace!(effect = %id, ?policy, "Executing Effect::Keyed");
                    metrics::counter!("store.effects.executed", "type" => "keyed").increment(1);

                    self.execute_keyed(&id, policy, *effect, tracking);
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                keyed: self.keyed.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                config: self.config.clone(),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
