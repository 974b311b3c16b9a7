//! Notification content construction.

use crate::types::TimerPhase;

/// Maximum length for task names in notifications.
const MAX_TASK_NAME_LENGTH: usize = 100;

/// Application name shown by the notification service.
pub const APP_NAME: &str = "Ambience";

/// Text of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationContent {
    pub title: String,
    pub subtitle: Option<String>,
    pub body: String,
}

impl NotificationContent {
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            body: body.into(),
        }
    }

    /// Sets the subtitle.
    #[must_use]
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Summary line: the title, with the subtitle appended when present.
    #[must_use]
    pub fn summary(&self) -> String {
        match &self.subtitle {
            Some(subtitle) => format!("{} · {}", self.title, subtitle),
            None => self.title.clone(),
        }
    }
}

/// Sanitizes a task name for display.
///
/// Returns the truncated name without control characters, or None if
/// nothing is left.
pub fn sanitize_task_name(task_name: &str) -> Option<String> {
    let sanitized: String = task_name
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_TASK_NAME_LENGTH)
        .collect();
    let trimmed = sanitized.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Content for the end of a timer phase.
///
/// `next` is the phase that follows, or `None` when the timer is done.
#[must_use]
pub fn phase_complete_content(
    ended: TimerPhase,
    next: Option<TimerPhase>,
    task: &str,
) -> NotificationContent {
    let title = format!("{} complete", ended.label());
    let body = match (ended, next) {
        (_, None) => "All rounds done. Nice work.".to_string(),
        (TimerPhase::Focus, Some(TimerPhase::Break)) => "Time for a break.".to_string(),
        (_, Some(TimerPhase::Focus)) => "Back to focus.".to_string(),
        (_, Some(phase)) => format!("{} started.", phase.label()),
    };

    let content = NotificationContent::new(title, body);
    match sanitize_task_name(task) {
        Some(task) => content.subtitle(task),
        None => content,
    }
}
