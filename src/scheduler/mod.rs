//! Two independent recurring timers: reminder and alert.
//!
//! The scheduler holds deadlines only; the event loop sleeps until
//! [`IntervalScheduler::next_deadline`], dispatches whatever
//! [`take_due`](IntervalScheduler::take_due) returns, then calls
//! [`rearm`](IntervalScheduler::rearm). A timer is disarmed between
//! `take_due` and `rearm`, so a firing can never overlap itself and missed
//! periods are not caught up.

use std::time::Duration;

use log::debug;
use tokio::time::Instant;

use crate::config::{IntervalSetting, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Reminder,
    Alert,
}

impl TimerKind {
    pub fn label(&self) -> &'static str {
        match self {
            TimerKind::Reminder => "reminder",
            TimerKind::Alert => "alert",
        }
    }
}

/// Derived timer configuration. Recomputed from settings, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSpec {
    pub enabled: bool,
    pub period: Duration,
}

impl TimerSpec {
    pub const DISABLED: TimerSpec = TimerSpec {
        enabled: false,
        period: Duration::ZERO,
    };

    /// A zero period cannot be scheduled and counts as disabled.
    pub fn new(enabled: bool, interval: &IntervalSetting) -> Self {
        let period = interval.period();
        Self {
            enabled: enabled && !period.is_zero(),
            period,
        }
    }

    pub fn for_kind(kind: TimerKind, settings: &Settings) -> Self {
        match kind {
            TimerKind::Reminder => Self::new(settings.panda_enabled, &settings.panda_interval),
            TimerKind::Alert => Self::new(settings.alert_enabled, &settings.alert_interval),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    spec: TimerSpec,
    next_due: Option<Instant>,
}

impl Timer {
    const fn idle() -> Self {
        Self {
            spec: TimerSpec::DISABLED,
            next_due: None,
        }
    }

    fn start(&mut self, now: Instant) {
        // An unrepresentable deadline means "never".
        self.next_due = if self.spec.enabled {
            now.checked_add(self.spec.period)
        } else {
            None
        };
    }
}

/// Owns the reminder and alert timers.
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    reminder: Timer,
    alert: Timer,
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalScheduler {
    /// Both timers stopped until the first [`configure`](Self::configure).
    pub fn new() -> Self {
        Self {
            reminder: Timer::idle(),
            alert: Timer::idle(),
        }
    }

    fn timer(&self, kind: TimerKind) -> &Timer {
        match kind {
            TimerKind::Reminder => &self.reminder,
            TimerKind::Alert => &self.alert,
        }
    }

    fn timer_mut(&mut self, kind: TimerKind) -> &mut Timer {
        match kind {
            TimerKind::Reminder => &mut self.reminder,
            TimerKind::Alert => &mut self.alert,
        }
    }

    /// Recompute both specs and restart every enabled timer from `now`.
    ///
    /// Disabled timers are stopped. Nothing is owed for periods that elapsed
    /// under the previous configuration.
    pub fn configure(&mut self, settings: &Settings, now: Instant) {
        for kind in [TimerKind::Reminder, TimerKind::Alert] {
            let spec = TimerSpec::for_kind(kind, settings);
            let timer = self.timer_mut(kind);
            timer.spec = spec;
            timer.start(now);
            debug!(
                "Scheduler: {} timer enabled={} period={:?}",
                kind.label(),
                spec.enabled,
                spec.period
            );
        }
    }

    pub fn spec(&self, kind: TimerKind) -> TimerSpec {
        self.timer(kind).spec
    }

    /// Whether the timer is counting toward a firing.
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.timer(kind).next_due.is_some()
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.timer(kind).next_due
    }

    /// Earliest pending deadline across both timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.reminder.next_due, self.alert.next_due) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Timers whose deadline has passed, reminder first. Each returned timer
    /// is disarmed until [`rearm`](Self::rearm) is called for it.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut due = Vec::new();
        for kind in [TimerKind::Reminder, TimerKind::Alert] {
            let timer = self.timer_mut(kind);
            if matches!(timer.next_due, Some(at) if at <= now) {
                timer.next_due = None;
                due.push(kind);
            }
        }
        due
    }

    /// Start the next period after a firing has been dispatched.
    ///
    /// No-op if the timer was disabled or already re-armed (for example by a
    /// `configure` issued from inside the dispatch).
    pub fn rearm(&mut self, kind: TimerKind, now: Instant) {
        let timer = self.timer_mut(kind);
        if timer.spec.enabled && timer.next_due.is_none() {
            timer.start(now);
        }
    }
}
