//! Desktop notification system.
//!
//! Announces timer phase changes through the platform notification
//! service. Permission follows a three-state model: nothing is asked until
//! the user turns notifications on, and a denied request is remembered for
//! the rest of the process.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │     Session      │────▶│     Notifier     │────▶│   notify-rust    │
//! │  (phase change)  │     │ (permission gate)│     │ (system service) │
//! └──────────────────┘     └──────────────────┘     └──────────────────┘
//! ```

mod content;
mod error;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use notify_rust::{Notification, Timeout};
use tracing::{debug, info, warn};

pub use content::{
    phase_complete_content, sanitize_task_name, NotificationContent, APP_NAME,
};
pub use error::NotificationError;

/// Display timeout for phase notifications, in milliseconds.
const NOTIFICATION_TIMEOUT_MS: u32 = 6_000;

/// Notification permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    /// Never requested.
    #[default]
    Default,
    Granted,
    Denied,
}

impl Permission {
    #[must_use]
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

/// Sends desktop notifications.
pub trait Notifier {
    /// Current permission state, without prompting.
    fn permission(&self) -> Permission;

    /// Requests permission. Only the first call may prompt; later calls
    /// return the settled state.
    fn request_permission(&self) -> Permission;

    /// Shows a notification.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` unless permission is granted, or an
    /// error from the notification service.
    fn notify(&self, content: &NotificationContent) -> Result<(), NotificationError>;
}

// ============================================================================
// DesktopNotifier
// ============================================================================

/// Notifier backed by the platform notification service.
#[derive(Debug, Default)]
pub struct DesktopNotifier {
    permission: Mutex<Permission>,
}

impl DesktopNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that a notification service is reachable.
    #[cfg(all(unix, not(target_os = "macos")))]
    fn probe() -> Permission {
        match notify_rust::get_server_information() {
            Ok(server) => {
                debug!("Notification server: {} {}", server.name, server.version);
                Permission::Granted
            }
            Err(e) => {
                warn!("No notification server available: {}", e);
                Permission::Denied
            }
        }
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn probe() -> Permission {
        Permission::Granted
    }
}

impl Notifier for DesktopNotifier {
    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn request_permission(&self) -> Permission {
        let mut permission = self.permission.lock().unwrap_or_else(|e| e.into_inner());
        if *permission == Permission::Default {
            *permission = Self::probe();
            info!("Notification permission: {:?}", *permission);
        }
        *permission
    }

    fn notify(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        if !self.permission().is_granted() {
            return Err(NotificationError::PermissionDenied);
        }

        Notification::new()
            .appname(APP_NAME)
            .summary(&content.summary())
            .body(&content.body)
            .timeout(Timeout::Milliseconds(NOTIFICATION_TIMEOUT_MS))
            .show()
            .map(|_| ())
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        debug!("Notification shown: {}", content.title);
        Ok(())
    }
}

// ============================================================================
// Mock
// ============================================================================

/// Mock notifier for testing.
#[derive(Debug)]
pub struct MockNotifier {
    permission: Mutex<Permission>,
    answer: Permission,
    requests: AtomicUsize,
    sent: Mutex<Vec<NotificationContent>>,
    send_error: Mutex<Option<NotificationError>>,
}

impl MockNotifier {
    /// Creates a notifier whose permission prompt answers `answer`.
    #[must_use]
    pub fn new(answer: Permission) -> Self {
        Self {
            permission: Mutex::new(Permission::Default),
            answer,
            requests: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            send_error: Mutex::new(None),
        }
    }

    /// A notifier that already holds permission.
    #[must_use]
    pub fn granted() -> Self {
        let notifier = Self::new(Permission::Granted);
        *notifier.permission.lock().unwrap() = Permission::Granted;
        notifier
    }

    /// Makes every `notify` call fail with `error`.
    pub fn fail_with(&self, error: NotificationError) {
        *self.send_error.lock().unwrap() = Some(error);
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn sent(&self) -> Vec<NotificationContent> {
        self.sent.lock().unwrap().clone()
    }

    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Notifier for MockNotifier {
    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    fn request_permission(&self) -> Permission {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut permission = self.permission.lock().unwrap();
        if *permission == Permission::Default {
            *permission = self.answer;
        }
        *permission
    }

    fn notify(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        if !self.permission().is_granted() {
            return Err(NotificationError::PermissionDenied);
        }
        if let Some(error) = self.send_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.sent.lock().unwrap().push(content.clone());
        Ok(())
    }
}
