//! # Catalog Core
//!
//! Core traits and types for the catalog state-management pipeline.
//!
//! This crate provides the abstractions every feature is built from:
//!
//! - **State**: the feature's single document (owned, `Clone`)
//! - **Action**: every input to a reducer (requests, outcomes, UI intents)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a description of asynchronous work, never its execution
//! - **Selector**: a memoized read projection over a state snapshot
//! - **Notifier**: the sink effects report user-facing outcomes to
//!
//! ## Architecture Principles
//!
//! - Functional core, imperative shell
//! - Unidirectional data flow
//! - Explicit effects (no hidden I/O in reducers)
//! - Dependency injection via the environment
//!
//! ## Example
//!
//! ```ignore
//! use catalog_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! impl Reducer for ProductsReducer {
//!     type State = ProductsState;
//!     type Action = ProductsAction;
//!     type Environment = ProductsEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut ProductsState,
//!         action: ProductsAction,
//!         env: &ProductsEnvironment,
//!     ) -> SmallVec<[Effect<ProductsAction>; 4]> {
//!         // Business logic goes here
//!         SmallVec::new()
//!     }
//! }
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Memoized selectors over state snapshots
pub mod selector;

/// Toast-style notifications emitted by effects
pub mod notification;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They are deterministic and testable without a runtime.
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
    /// The runtime hands the reducer a private working copy of the state, so a
    /// snapshot that was already published to readers is never mutated.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This must not perform I/O or block. Asynchronous work is returned
        /// as effect descriptions for the runtime to execute.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and can be bound to a
/// concurrency policy with [`Effect::switch`] or [`Effect::exhaust`].
pub mod effect {
    use std::borrow::Cow;
    use std::future::Future;
    use std::pin::Pin;

    /// Identifies a family of keyed effects that share a concurrency policy
    ///
    /// Two keyed effects with the same id compete with each other; effects with
    /// different ids never interact.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct EffectId(Cow<'static, str>);

    impl EffectId {
        /// Create an id from a static name
        #[must_use]
        pub const fn new(name: &'static str) -> Self {
            Self(Cow::Borrowed(name))
        }

        /// Create an id from a runtime string
        #[must_use]
        pub fn owned(name: impl Into<String>) -> Self {
            Self(Cow::Owned(name.into()))
        }

        /// The id as a string slice
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl std::fmt::Display for EffectId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// How a keyed effect behaves when another effect with the same id is
    /// already in flight
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Concurrency {
        /// Latest wins: the in-flight effect is cancelled and its result discarded
        Switch,

        /// First wins: the new effect is dropped until the in-flight one completes
        Exhaust,
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should
    /// happen, returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// An effect bound to a concurrency policy
        ///
        /// The runtime tracks in-flight keyed effects per [`EffectId`] and applies
        /// `policy` when a new one with the same id arrives.
        Keyed {
            /// Family this effect competes in
            id: EffectId,
            /// What to do when one of the family is already running
            policy: Concurrency,
            /// The wrapped effect
            effect: Box<Effect<Action>>,
        },
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Keyed { id, policy, effect } => f
                    .debug_struct("Effect::Keyed")
                    .field("id", id)
                    .field("policy", policy)
                    .field("effect", effect)
                    .finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async computation
        #[must_use]
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Bind this effect to latest-wins semantics under `id`
        #[must_use]
        pub fn switch(self, id: EffectId) -> Effect<Action> {
            Effect::Keyed {
                id,
                policy: Concurrency::Switch,
                effect: Box::new(self),
            }
        }

        /// Bind this effect to first-wins semantics under `id`
        #[must_use]
        pub fn exhaust(self, id: EffectId) -> Effect<Action> {
            Effect::Keyed {
                id,
                policy: Concurrency::Exhaust,
                effect: Box::new(self),
            }
        }

        /// The policy and id of a keyed effect, if this is one
        #[must_use]
        pub const fn keyed(&self) -> Option<(&EffectId, Concurrency)> {
            match self {
                Effect::Keyed { id, policy, .. } => Some((id, *policy)),
                _ => None,
            }
        }
    }
}
