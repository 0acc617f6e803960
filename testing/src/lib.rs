//! # Catalog Testing
//!
//! Testing utilities and helpers for the catalog state-management pipeline.
//!
//! This crate provides:
//! - Mock implementations of environment collaborators
//! - The [`ReducerTest`] Given-When-Then harness
//! - Assertion helpers for reducer effects
//!
//! ## Example
//!
//! ```ignore
//! use catalog_testing::mocks::RecordingNotifier;
//! use catalog_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_create_flow() {
//!     let notifier = RecordingNotifier::new();
//!     let env = ProductsEnvironment::new(service, notifier.clone());
//!     let store = Store::new(ProductsState::default(), ProductsReducer::new(), env);
//!
//!     store.send(ProductsAction::LoadProducts).await?;
//!
//!     assert_eq!(notifier.len(), 0);
//! }
//! ```


/// Mock implementations for testing.
pub mod mocks {
    use catalog_core::notification::{Notification, Notifier, Severity};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Notifier that records every notification it receives
    ///
    /// Clones share the same record, so a test can keep one clone and hand
    /// another to the environment.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_testing::mocks::RecordingNotifier;
    /// use catalog_core::notification::{Notification, Notifier};
    ///
    /// let notifier = RecordingNotifier::new();
    /// notifier.notify(Notification::success("Done", "Saved"));
    /// assert_eq!(notifier.len(), 1);
    /// ```
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier {
        received: Arc<Mutex<Vec<Notification>>>,
    }

    impl RecordingNotifier {
        /// Create a notifier with an empty record
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Every notification received so far, oldest first
        #[must_use]
        pub fn notifications(&self) -> Vec<Notification> {
            self.received
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// The most recent notification
        #[must_use]
        pub fn last(&self) -> Option<Notification> {
            self.received
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .last()
                .cloned()
        }

        /// Number of notifications received
        #[must_use]
        pub fn len(&self) -> usize {
            self.received
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }

        /// Whether nothing was received
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Number of notifications with the given severity
        #[must_use]
        pub fn count(&self, severity: Severity) -> usize {
            self.received
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .filter(|n| n.severity == severity)
                .count()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.received
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notification);
        }
    }
}

// Re-export commonly used items
pub use mocks::RecordingNotifier;
pub use reducer_test::{ReducerTest, assertions};
