//! Notification system error types.
//!
//! None of these stop the timer: a notification that cannot be shown is
//! logged and the phase transition goes ahead.

use thiserror::Error;

/// Errors that can occur in the notification system.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// Notification permission was denied by the user or the system.
    #[error("notification permission denied")]
    PermissionDenied,

    /// Failed to send a notification.
    #[error("failed to send notification: {0}")]
    SendFailed(String),

    /// No notification service is running.
    #[error("notification service not available")]
    NotAvailable,
}

impl NotificationError {
    /// Returns true if this error is related to permissions.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Allow notifications for ambience in your system settings",
            Self::SendFailed(_) => "Check your notification center",
            Self::NotAvailable => "Start a notification daemon or disable notifications",
        }
    }
}
