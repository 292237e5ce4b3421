//! Transient user-facing notifications raised by the stores.

use parking_lot::Mutex;
use std::fmt;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// An operation completed.
    Success,
    /// An operation failed.
    Error,
}

/// A message meant for the user, not the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: Level,
    /// Message text.
    pub message: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Level::Success => write!(f, "{}", self.message),
            Level::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Sink for notifications.
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    fn notify(&self, notification: Notification);

    /// Shorthand for a success notification.
    fn success(&self, message: &str) {
        self.notify(Notification {
            level: Level::Success,
            message: message.to_string(),
        });
    }

    /// Shorthand for an error notification.
    fn error(&self, message: &str) {
        self.notify(Notification {
            level: Level::Error,
            message: message.to_string(),
        });
    }
}

/// Forwards notifications to the log.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Success => tracing::info!(message = %notification.message, "Notification"),
            Level::Error => tracing::warn!(message = %notification.message, "Notification"),
        }
    }
}

/// Keeps notifications in memory until drained.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    inner: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    /// Take every notification received so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.inner.lock())
    }

    /// Message of the most recent notification.
    pub fn last_message(&self) -> Option<String> {
        self.inner.lock().last().map(|n| n.message.clone())
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.inner.lock().push(notification);
    }
}
