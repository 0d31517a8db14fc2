//! Hook for the presentation layer.
//!
//! The session never renders anything itself. Toasts and the "you have
//! been blocked" dialog go through the [`Presenter`] trait, which the
//! embedding console implements.

use std::fmt;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Plain information (`incomingNotification`).
    Info,
    /// Something the operator should look at (`showAlertNotification`).
    Alert,
    /// Something failed (`showErrorNotification`, local precondition errors).
    Error,
}

/// A user-facing message, kept in the session's notification history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            NotificationKind::Info => "info",
            NotificationKind::Alert => "alert",
            NotificationKind::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// Renders session side effects for the operator.
///
/// # Trait bounds
///
/// `Send + 'static` because the presenter lives inside the session, which
/// runs on its own Tokio task.
pub trait Presenter: Send + 'static {
    /// Shows a toast.
    fn show_notification(&mut self, notification: &Notification);

    /// Shows the modal "you have been blocked" dialog.
    fn show_blocked_dialog(&mut self, message: &str);

    /// Hides the blocked dialog.
    fn hide_blocked_dialog(&mut self);
}

/// A [`Presenter`] that only writes to the log. Used when the embedding
/// application does not supply one.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn show_notification(&mut self, notification: &Notification) {
        tracing::info!(%notification, "notification");
    }

    fn show_blocked_dialog(&mut self, message: &str) {
        tracing::warn!(message, "blocked by a developer");
    }

    fn hide_blocked_dialog(&mut self) {
        tracing::info!("unblocked");
    }
}
