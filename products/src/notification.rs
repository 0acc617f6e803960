//! User-facing messages for the products feature.
//!
//! The effect pipeline reports every write outcome (and load failures) with
//! one of these fixed texts. Raw failure detail goes to the log only.

use catalog_core::notification::{Notification, Notifier, Severity};

/// Summary of success notifications
pub const SUCCESS_SUMMARY: &str = "Sucesso";

/// Summary of error notifications
pub const ERROR_SUMMARY: &str = "Erro";

/// Used when a failure carries no message of its own
pub const FALLBACK_ERROR_MESSAGE: &str = "Ocorreu um erro";

/// The four data-source operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Fetch the catalog
    Load,
    /// Create a product
    Create,
    /// Replace a product
    Update,
    /// Delete a product
    Delete,
}

impl OperationKind {
    /// Fixed message shown when this operation fails
    #[must_use]
    pub const fn error_message(self) -> &'static str {
        match self {
            Self::Load => "Não foi possível carregar os produtos",
            Self::Create => "Não foi possível criar o produto",
            Self::Update => "Não foi possível atualizar o produto",
            Self::Delete => "Não foi possível deletar o produto",
        }
    }

    /// Fixed message shown when this operation succeeds
    ///
    /// Loads succeed silently.
    #[must_use]
    pub const fn success_message(self) -> Option<&'static str> {
        match self {
            Self::Load => None,
            Self::Create => Some("Produto criado com sucesso"),
            Self::Update => Some("Produto atualizado com sucesso"),
            Self::Delete => Some("Produto deletado com sucesso"),
        }
    }

    /// Success notification for this operation, if it has one
    #[must_use]
    pub fn success_notification(self) -> Option<Notification> {
        self.success_message()
            .map(|detail| Notification::success(SUCCESS_SUMMARY, detail))
    }

    /// Error notification for this operation
    #[must_use]
    pub fn error_notification(self) -> Notification {
        Notification::error(ERROR_SUMMARY, self.error_message())
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Notifier that writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Success => tracing::info!(
                summary = %notification.summary,
                "{}", notification.detail
            ),
            Severity::Error => tracing::error!(
                summary = %notification.summary,
                "{}", notification.detail
            ),
        }
    }
}
