//! Transient user-facing notifications (toasts).
//!
//! Effects report the outcome of user-initiated work through a [`Notifier`]
//! held in the environment. Delivery is fire-and-forget.

/// How a notification should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation succeeded
    Success,
    /// The operation failed
    Error,
}

/// A message for the notification sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Presentation style
    pub severity: Severity,
    /// Short headline
    pub summary: String,
    /// Message body
    pub detail: String,
}

impl Notification {
    /// A success notification
    #[must_use]
    pub fn success(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// An error notification
    #[must_use]
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

/// Notification sink
///
/// Implementations must not block; a slow sink should queue internally.
pub trait Notifier: Send + Sync {
    /// Display `notification`
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}
