use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::{FormId, NOTIFICATION_VISIBILITY, NotificationRecord, Severity};

#[derive(Debug, Default)]
struct ChannelState {
    current: Option<NotificationRecord>,
    published: u64,
}

/// Per-form status messages. Publishing replaces whatever the channel was
/// showing; each message hides itself once its visibility window elapses.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    channels: Arc<Mutex<HashMap<FormId, ChannelState>>>,
    visible_for: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_visibility(NOTIFICATION_VISIBILITY)
    }

    pub fn with_visibility(visible_for: Duration) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            visible_for,
        }
    }

    pub fn notify(
        &self,
        channel: &FormId,
        message: impl Into<String>,
        severity: Severity,
    ) -> NotificationRecord {
        self.notify_at(channel, message, severity, Instant::now())
    }

    pub fn notify_at(
        &self,
        channel: &FormId,
        message: impl Into<String>,
        severity: Severity,
        shown_at: Instant,
    ) -> NotificationRecord {
        let record = NotificationRecord {
            channel: channel.clone(),
            message: message.into(),
            severity,
            shown_at,
            visible_for: self.visible_for,
        };
        debug!(channel = %channel, ?severity, message = %record.message, "notification published");

        let mut channels = self
            .channels
            .lock()
            .expect("notification channel lock poisoned");
        let state = channels.entry(channel.clone()).or_default();
        state.current = Some(record.clone());
        state.published = state.published.saturating_add(1);
        record
    }

    pub fn clear(&self, channel: &FormId) {
        let mut channels = self
            .channels
            .lock()
            .expect("notification channel lock poisoned");
        if let Some(state) = channels.get_mut(channel) {
            state.current = None;
        }
    }

    pub fn current(&self, channel: &FormId) -> Option<NotificationRecord> {
        self.current_at(channel, Instant::now())
    }

    pub fn current_at(&self, channel: &FormId, now: Instant) -> Option<NotificationRecord> {
        let channels = self
            .channels
            .lock()
            .expect("notification channel lock poisoned");
        channels
            .get(channel)
            .and_then(|state| state.current.as_ref())
            .filter(|record| record.is_visible_at(now))
            .cloned()
    }

    /// Latest record on the channel regardless of its visibility window.
    pub fn latest(&self, channel: &FormId) -> Option<NotificationRecord> {
        let channels = self
            .channels
            .lock()
            .expect("notification channel lock poisoned");
        channels
            .get(channel)
            .and_then(|state| state.current.clone())
    }

    pub fn published_count(&self, channel: &FormId) -> u64 {
        let channels = self
            .channels
            .lock()
            .expect("notification channel lock poisoned");
        channels.get(channel).map_or(0, |state| state.published)
    }
}
