use std::fmt;
use std::time::{Duration, Instant};

pub const NOTIFICATION_VISIBILITY: Duration = Duration::from_millis(5000);

/// Key of a form's shared presentation surfaces (notification channel and busy toggle).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormId(String);

impl FormId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub channel: FormId,
    pub message: String,
    pub severity: Severity,
    pub shown_at: Instant,
    pub visible_for: Duration,
}

impl NotificationRecord {
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < self.visible_for
    }
}
