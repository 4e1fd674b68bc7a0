//! Application struct and event loop.
//!
//! Owns settings, the scheduler, the reminder lifecycle, and the front end.
//! Timer firings, channel commands, and front-end signals are all handled
//! here, one at a time, on a single task.

use std::future::Future;

use anyhow::Result;
use log::{debug, info};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::channel::Command;
use crate::config::{ConfigStore, Settings};
use crate::error::PandaError;
use crate::lifecycle::{Outcome, ReminderLifecycle};
use crate::notifications::{NotifyEvent, OperatorNotifier};
use crate::scheduler::{IntervalScheduler, TimerKind};
use crate::ui::{AnswerHandle, Presenter, SettingsEditor, Signal};

/// Everything that can wake the loop besides a timer.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Command forwarded from the channel server.
    Command(Command),
    /// Panda reached the screen for this session.
    Arrived(u64),
    /// User answered this session's prompt.
    Answered(u64, Outcome),
    /// Reaction dwell finished for this session.
    DwellComplete(u64),
    /// Panda left the screen for this session.
    Departed(u64),
    AlertDismissed,
    /// Settings editor confirmed an edit.
    SettingsEdited(Box<Settings>),
}

/// Main application struct.
pub struct App {
    store: ConfigStore,
    settings: Settings,
    scheduler: IntervalScheduler,
    lifecycle: ReminderLifecycle,
    presenter: Box<dyn Presenter>,
    notifier: OperatorNotifier,

    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,

    /// True while a full-screen alert is up.
    alert_active: bool,
}

impl App {
    pub fn new(store: ConfigStore, settings: Settings, presenter: Box<dyn Presenter>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            store,
            settings,
            scheduler: IntervalScheduler::new(),
            lifecycle: ReminderLifecycle::new(),
            presenter,
            notifier: OperatorNotifier::default(),
            events_tx,
            events_rx,
            alert_active: false,
        }
    }

    /// Replace the lifecycle (seeded side selection in tests).
    pub fn with_lifecycle(mut self, lifecycle: ReminderLifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Sender for the channel server and front-end handles.
    pub fn events(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.events_tx.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scheduler(&self) -> &IntervalScheduler {
        &self.scheduler
    }

    pub fn lifecycle(&self) -> &ReminderLifecycle {
        &self.lifecycle
    }

    pub fn alert_active(&self) -> bool {
        self.alert_active
    }

    /// Arm the timers, or on first run open settings and leave them off
    /// until an edit is confirmed.
    pub fn start(&mut self, now: Instant) {
        if self.settings.first_run {
            info!("First run: opening settings");
            let editor = SettingsEditor::new(self.events());
            self.presenter.open_settings(&self.settings, editor);
            return;
        }
        self.scheduler.configure(&self.settings, now);
    }

    /// Run until `shutdown` resolves. Call [`start`](Self::start) first.
    pub async fn run<F: Future<Output = ()>>(&mut self, shutdown: F) -> Result<()> {
        tokio::pin!(shutdown);
        loop {
            let deadline = self.scheduler.next_deadline();
            tokio::select! {
                _ = &mut shutdown => {
                    self.shutdown();
                    break;
                }
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                _ = sleep_until(deadline) => self.fire_due_timers(Instant::now()),
            }
        }
        Ok(())
    }

    /// Dispatch every timer due at `now`, re-arming each after its dispatch.
    pub fn fire_due_timers(&mut self, now: Instant) {
        for kind in self.scheduler.take_due(now) {
            debug!("Timer fired: {}", kind.label());
            match kind {
                TimerKind::Reminder => self.trigger_reminder(),
                TimerKind::Alert => self.trigger_alert(),
            }
            self.scheduler.rearm(kind, Instant::now());
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Command(command) => self.handle_command(command),
            AppEvent::Arrived(id) => match self.lifecycle.arrived(id) {
                Some(session) => {
                    let answer = AnswerHandle::new(self.events(), id);
                    self.presenter.present_prompt(&session.task, answer);
                }
                None => debug!("Ignoring arrival for session {}", id),
            },
            AppEvent::Answered(id, outcome) => match self.lifecycle.answer(id, outcome) {
                Some(session) => {
                    // Written before the reaction starts so the entry cannot be
                    // lost to a failure later in the cycle.
                    if let Err(e) = self.store.append_history(&session.task, outcome.is_completed()) {
                        self.report(NotifyEvent::HistoryWriteFailed, &e);
                    }
                    let done = Signal::new(self.events(), AppEvent::DwellComplete(id));
                    self.presenter.react(outcome, done);
                }
                None => debug!("Ignoring answer for session {}", id),
            },
            AppEvent::DwellComplete(id) => match self.lifecycle.dwell_complete(id) {
                Some(session) => {
                    let left = Signal::new(self.events(), AppEvent::Departed(id));
                    self.presenter.animate_exit(session.side, left);
                }
                None => debug!("Ignoring dwell completion for session {}", id),
            },
            AppEvent::Departed(id) => match self.lifecycle.departed(id) {
                Some(session) => debug!(
                    "Reminder {} finished after {:?}",
                    session.id,
                    session.started_at.elapsed()
                ),
                None => debug!("Ignoring departure for session {}", id),
            },
            AppEvent::AlertDismissed => {
                self.alert_active = false;
            }
            AppEvent::SettingsEdited(settings) => {
                // Rejections are reported inside apply_settings.
                let _ = self.apply_settings(*settings);
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Show => self.trigger_reminder(),
            Command::RedAlert => self.trigger_alert(),
            Command::Settings => {
                let editor = SettingsEditor::new(self.events());
                self.presenter.open_settings(&self.settings, editor);
            }
            Command::History => {
                let entries = self.store.read_history();
                self.presenter.show_history(&entries);
            }
        }
    }

    /// Start a reminder unless one is already running.
    pub fn trigger_reminder(&mut self) {
        match self.lifecycle.trigger(&self.settings.tasks) {
            Some(session) => {
                debug!(
                    "Reminder {}: {:?} from {:?}",
                    session.id, session.task, session.side
                );
                let arrived = Signal::new(self.events(), AppEvent::Arrived(session.id));
                self.presenter.animate(session.side, arrived);
            }
            None if self.lifecycle.is_idle() => debug!("No tasks configured; reminder skipped"),
            None => debug!(
                "Reminder busy ({}); trigger dropped",
                self.lifecycle.state().label()
            ),
        }
    }

    /// Show the full-screen alert unless one is already up.
    pub fn trigger_alert(&mut self) {
        if self.alert_active {
            debug!("Alert already showing; trigger dropped");
            return;
        }
        self.alert_active = true;
        let dismissed = Signal::new(self.events(), AppEvent::AlertDismissed);
        self.presenter
            .present_full_screen_alert(&self.settings.alert_message, dismissed);
    }

    /// Validate, persist, and apply an edit, then reconfigure the timers.
    ///
    /// A rejected edit changes nothing. A failed write is reported but the
    /// edit still takes effect for this run.
    pub fn apply_settings(&mut self, mut settings: Settings) -> crate::error::Result<()> {
        if let Err(e) = settings.validate() {
            self.report(NotifyEvent::SettingsRejected, &e);
            return Err(e);
        }
        settings.first_run = false;
        if let Err(e) = self.store.save(&settings) {
            self.report(NotifyEvent::SettingsWriteFailed, &e);
        }
        self.settings = settings;
        self.scheduler.configure(&self.settings, Instant::now());
        info!("Settings applied");
        Ok(())
    }

    /// Cancel any live reminder. Nothing beyond what was already logged is written.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.lifecycle.cancel() {
            info!("Shutting down; abandoning reminder {:?}", session.task);
        }
    }

    /// Handle every queued event without waiting. Returns how many ran.
    pub fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    fn report(&mut self, event: NotifyEvent, error: &PandaError) {
        self.notifier
            .notify(self.presenter.as_mut(), event, &error.to_string());
    }
}

/// Sleep until `deadline`, or forever when there is none.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
