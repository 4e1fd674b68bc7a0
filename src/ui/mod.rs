//! Interface to the front end that draws the panda.
//!
//! The core never renders anything itself. It calls a [`Presenter`] and
//! hands it a one-shot handle for each callback it expects back. Handles
//! are consumed when fired, so each request yields at most one signal, and
//! every signal lands in the app's event queue rather than re-entering the
//! core directly.

pub mod terminal;

use tokio::sync::mpsc::UnboundedSender;

use crate::app::AppEvent;
use crate::config::Settings;
use crate::history::HistoryEntry;
use crate::lifecycle::{Outcome, Side};

pub use terminal::TerminalPresenter;

/// Everything the core asks of the front end.
pub trait Presenter {
    /// Bring the panda on screen from `side`; fire `arrived` once it is there.
    fn animate(&mut self, side: Side, arrived: Signal);

    /// Send the panda back off `side`; fire `left` once it is gone.
    fn animate_exit(&mut self, side: Side, left: Signal);

    /// Play the reaction for `outcome`; fire `dwell_complete` after the dwell.
    fn react(&mut self, outcome: Outcome, dwell_complete: Signal);

    /// Ask the user about `task`.
    fn present_prompt(&mut self, task: &str, answer: AnswerHandle);

    /// Cover the screen with `message`; fire `dismissed` when it is taken down.
    fn present_full_screen_alert(&mut self, message: &str, dismissed: Signal);

    /// Open the settings editor on `current`.
    fn open_settings(&mut self, current: &Settings, editor: SettingsEditor);

    fn show_history(&mut self, entries: &[HistoryEntry]);

    /// Non-fatal message for the operator.
    fn notify(&mut self, title: &str, body: &str);
}

/// One-shot callback that posts a fixed event back to the app.
#[derive(Debug)]
pub struct Signal {
    tx: UnboundedSender<AppEvent>,
    event: AppEvent,
}

impl Signal {
    pub fn new(tx: UnboundedSender<AppEvent>, event: AppEvent) -> Self {
        Self { tx, event }
    }

    pub fn fire(self) {
        // A closed queue means the app is shutting down.
        let _ = self.tx.send(self.event);
    }
}

/// Yes/No reply for one session's prompt.
#[derive(Debug)]
pub struct AnswerHandle {
    tx: UnboundedSender<AppEvent>,
    session: u64,
}

impl AnswerHandle {
    pub fn new(tx: UnboundedSender<AppEvent>, session: u64) -> Self {
        Self { tx, session }
    }

    pub fn answer(self, outcome: Outcome) {
        let _ = self.tx.send(AppEvent::Answered(self.session, outcome));
    }

    pub fn yes(self) {
        self.answer(Outcome::Completed);
    }

    pub fn no(self) {
        self.answer(Outcome::Missed);
    }
}

/// Confirms a settings edit. Dropping it without confirming cancels the edit.
#[derive(Debug)]
pub struct SettingsEditor {
    tx: UnboundedSender<AppEvent>,
}

impl SettingsEditor {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    pub fn confirm(self, settings: Settings) {
        let _ = self.tx.send(AppEvent::SettingsEdited(Box::new(settings)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn signal_posts_its_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        Signal::new(tx, AppEvent::Arrived(3)).fire();
        assert_eq!(rx.try_recv().unwrap(), AppEvent::Arrived(3));
    }

    #[test]
    fn answer_handle_tags_session() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        AnswerHandle::new(tx.clone(), 9).yes();
        AnswerHandle::new(tx, 10).no();
        assert_eq!(rx.try_recv().unwrap(), AppEvent::Answered(9, Outcome::Completed));
        assert_eq!(rx.try_recv().unwrap(), AppEvent::Answered(10, Outcome::Missed));
    }

    #[test]
    fn firing_after_queue_closed_is_harmless() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        Signal::new(tx, AppEvent::AlertDismissed).fire();
    }
}
