use {async_trait::async_trait, thiserror::Error};

use crate::notification::NotificationRequest;

/// Why a notification could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("missing permission to post in the notification channel")]
    PermissionDenied,

    #[error("notification channel not found")]
    ChannelNotFound,

    #[error("notification role not found")]
    RoleNotFound,

    #[error("transient delivery failure: {0}")]
    TransientFailure(String),
}

impl NotifyError {
    /// Transient failures may succeed on a later event; the others need an
    /// admin to fix the guild's setup.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFailure(_))
    }
}

/// Delivers notification requests to the platform.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError>;
}
