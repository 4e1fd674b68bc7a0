//! Operator notifications for non-fatal failures.
//!
//! Every event is logged at `warn`. It is also shown through the front
//! end's `notify`, at most once per event kind per rate-limit window, so a
//! persistently unwritable disk does not spam the user on every reminder.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::warn;

use crate::constants::{APP_NAME, NOTIFY_RATE_LIMIT_SECS};
use crate::ui::Presenter;

/// Event types for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyEvent {
    /// History entry could not be written.
    HistoryWriteFailed,
    /// Settings file could not be written.
    SettingsWriteFailed,
    /// A settings edit failed validation.
    SettingsRejected,
}

impl NotifyEvent {
    /// Title shown for each event type.
    pub fn title(&self) -> &'static str {
        match self {
            NotifyEvent::HistoryWriteFailed => "Could not save reminder history",
            NotifyEvent::SettingsWriteFailed => "Could not save settings",
            NotifyEvent::SettingsRejected => "Settings not applied",
        }
    }
}

/// Rate-limited notification sink.
pub struct OperatorNotifier {
    /// Last shown time per event type.
    last_sent: HashMap<NotifyEvent, Instant>,
    rate_limit: Duration,
}

impl Default for OperatorNotifier {
    fn default() -> Self {
        Self::new(Duration::from_secs(NOTIFY_RATE_LIMIT_SECS))
    }
}

impl OperatorNotifier {
    pub fn new(rate_limit: Duration) -> Self {
        Self {
            last_sent: HashMap::new(),
            rate_limit,
        }
    }

    /// Check if we can show this event type (rate limiting).
    fn can_send(&self, event: NotifyEvent) -> bool {
        match self.last_sent.get(&event) {
            Some(last) => last.elapsed() >= self.rate_limit,
            None => true,
        }
    }

    /// Log `detail` and, unless rate-limited, show it to the user.
    ///
    /// Returns whether the front end was notified.
    pub fn notify(&mut self, presenter: &mut dyn Presenter, event: NotifyEvent, detail: &str) -> bool {
        warn!("{}: {}", event.title(), detail);
        if !self.can_send(event) {
            return false;
        }
        self.last_sent.insert(event, Instant::now());
        presenter.notify(&format!("{} - {}", APP_NAME, event.title()), detail);
        true
    }
}
