//! Memoized read projections.
//!
//! A [`Selector`] wraps a pure projection `Fn(&S) -> T` with a single-slot
//! cache keyed by the identity of the state snapshot (`Arc<S>` pointer).
//! Selecting twice from the same snapshot returns the same `Arc<T>`, so callers
//! can detect "nothing changed" with [`Arc::ptr_eq`] instead of deep equality.
//!
//! The cache holds a [`Weak`] reference to the snapshot, which keeps the
//! allocation address reserved without keeping the state alive.
//!
//! # Example
//!
//! ```
//! use catalog_core::selector::Selector;
//! use std::sync::Arc;
//!
//! struct State { items: Vec<u32> }
//!
//! let count = Selector::new(|s: &State| s.items.len());
//! let snapshot = Arc::new(State { items: vec![1, 2, 3] });
//!
//! let first = count.select(&snapshot);
//! let second = count.select(&snapshot);
//! assert_eq!(*first, 3);
//! assert!(Arc::ptr_eq(&first, &second));
//! ```

use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Type alias for the boxed projection function
type Projection<S, T> = Box<dyn Fn(&S) -> T + Send + Sync>;

/// Single-slot cache entry: the snapshot the value was computed from
struct Memo<S, T> {
    source: Weak<S>,
    value: Arc<T>,
}

/// A pure projection with a single-slot, identity-keyed cache
pub struct Selector<S, T> {
    project: Projection<S, T>,
    memo: Mutex<Option<Memo<S, T>>>,
}

impl<S, T> Selector<S, T> {
    /// Create a selector from a pure projection
    #[must_use]
    pub fn new<F>(project: F) -> Self
    where
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        Self {
            project: Box::new(project),
            memo: Mutex::new(None),
        }
    }

    /// Project `state`, reusing the cached result when `state` is the same
    /// snapshot as the previous call
    pub fn select(&self, state: &Arc<S>) -> Arc<T> {
        // A poisoned lock only means a projection panicked; the slot is still usable
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = memo.as_ref() {
            if std::ptr::eq(entry.source.as_ptr(), Arc::as_ptr(state)) {
                return Arc::clone(&entry.value);
            }
        }

        let value = Arc::new((self.project)(state));
        *memo = Some(Memo {
            source: Arc::downgrade(state),
            value: Arc::clone(&value),
        });
        value
    }

    /// Project `state` without consulting or updating the cache
    pub fn project(&self, state: &S) -> T {
        (self.project)(state)
    }

    /// Drop the cached result
    pub fn reset(&self) {
        *self.memo.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl<S, T> std::fmt::Debug for Selector<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self
            .memo
            .lock()
            .map(|memo| memo.is_some())
            .unwrap_or(false);
        f.debug_struct("Selector")
            .field("cached", &cached)
            .finish_non_exhaustive()
    }
}
