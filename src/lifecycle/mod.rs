//! Reminder lifecycle state machine.
//!
//! State flow: Idle → Entering → AwaitingResponse → Reacting → Exiting → Idle
//!
//! At most one session is live. Triggers outside `Idle` are dropped, and
//! signals that do not match the live session and its current state are
//! ignored, so a late or duplicated collaborator callback cannot move the
//! machine.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Which screen edge the panda runs in from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// The user's answer to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Missed,
}

impl Outcome {
    pub fn from_answer(yes: bool) -> Self {
        if yes {
            Outcome::Completed
        } else {
            Outcome::Missed
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }
}

/// One in-flight reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSession {
    /// Unique within a process run; stale signals carry an older id.
    pub id: u64,
    pub task: String,
    pub side: Side,
    pub started_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReminderState {
    #[default]
    Idle,
    Entering(ReminderSession),
    AwaitingResponse(ReminderSession),
    Reacting(ReminderSession, Outcome),
    Exiting(ReminderSession),
}

impl ReminderState {
    pub fn label(&self) -> &'static str {
        match self {
            ReminderState::Idle => "Idle",
            ReminderState::Entering(_) => "Entering",
            ReminderState::AwaitingResponse(_) => "AwaitingResponse",
            ReminderState::Reacting(..) => "Reacting",
            ReminderState::Exiting(_) => "Exiting",
        }
    }

    pub fn session(&self) -> Option<&ReminderSession> {
        match self {
            ReminderState::Idle => None,
            ReminderState::Entering(s)
            | ReminderState::AwaitingResponse(s)
            | ReminderState::Reacting(s, _)
            | ReminderState::Exiting(s) => Some(s),
        }
    }
}

/// Pick the task at `index` (wrapping) and the index to use next time.
///
/// Returns `None` for an empty list.
pub fn next_task(tasks: &[String], index: usize) -> Option<(&str, usize)> {
    if tasks.is_empty() {
        return None;
    }
    let i = index % tasks.len();
    Some((tasks[i].as_str(), (i + 1) % tasks.len()))
}

/// Uniform choice of screen side.
pub fn pick_side<R: Rng + ?Sized>(rng: &mut R) -> Side {
    if rng.random_bool(0.5) {
        Side::Left
    } else {
        Side::Right
    }
}

/// Drives one reminder at a time from trigger to completion.
pub struct ReminderLifecycle {
    state: ReminderState,
    /// Round-robin position; survives sessions, reset per process.
    task_index: usize,
    next_id: u64,
    rng: StdRng,
}

impl Default for ReminderLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ReminderLifecycle {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic side selection, for tests.
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            state: ReminderState::Idle,
            task_index: 0,
            next_id: 1,
            rng,
        }
    }

    pub fn state(&self) -> &ReminderState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ReminderState::Idle)
    }

    pub fn session(&self) -> Option<&ReminderSession> {
        self.state.session()
    }

    /// Idle → Entering.
    ///
    /// Returns the new session, or `None` when a session is already live or
    /// there is no task to ask about.
    pub fn trigger(&mut self, tasks: &[String]) -> Option<ReminderSession> {
        if !self.is_idle() {
            return None;
        }
        let (task, next_index) = next_task(tasks, self.task_index)?;
        let session = ReminderSession {
            id: self.next_id,
            task: task.to_string(),
            side: pick_side(&mut self.rng),
            started_at: Instant::now(),
        };
        self.task_index = next_index;
        self.next_id += 1;
        self.state = ReminderState::Entering(session.clone());
        Some(session)
    }

    /// Entering → AwaitingResponse on the arrival signal.
    pub fn arrived(&mut self, id: u64) -> Option<ReminderSession> {
        match &self.state {
            ReminderState::Entering(s) if s.id == id => {
                let session = s.clone();
                self.state = ReminderState::AwaitingResponse(session.clone());
                Some(session)
            }
            _ => None,
        }
    }

    /// AwaitingResponse → Reacting. Only the first answer counts.
    ///
    /// The caller records history for the returned session before starting
    /// the reaction dwell.
    pub fn answer(&mut self, id: u64, outcome: Outcome) -> Option<ReminderSession> {
        match &self.state {
            ReminderState::AwaitingResponse(s) if s.id == id => {
                let session = s.clone();
                self.state = ReminderState::Reacting(session.clone(), outcome);
                Some(session)
            }
            _ => None,
        }
    }

    /// Reacting → Exiting once the dwell has elapsed.
    pub fn dwell_complete(&mut self, id: u64) -> Option<ReminderSession> {
        match &self.state {
            ReminderState::Reacting(s, _) if s.id == id => {
                let session = s.clone();
                self.state = ReminderState::Exiting(session.clone());
                Some(session)
            }
            _ => None,
        }
    }

    /// Exiting → Idle on the departure signal; releases the busy guard.
    pub fn departed(&mut self, id: u64) -> Option<ReminderSession> {
        match &self.state {
            ReminderState::Exiting(s) if s.id == id => {
                let session = s.clone();
                self.state = ReminderState::Idle;
                Some(session)
            }
            _ => None,
        }
    }

    /// Drop the live session from any state. Nothing is logged here.
    pub fn cancel(&mut self) -> Option<ReminderSession> {
        let session = self.state.session().cloned();
        self.state = ReminderState::Idle;
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn lifecycle() -> ReminderLifecycle {
        ReminderLifecycle::with_rng(StdRng::seed_from_u64(7))
    }

    /// Run a full cycle and return the session.
    fn run_cycle(lc: &mut ReminderLifecycle, list: &[String], outcome: Outcome) -> ReminderSession {
        let s = lc.trigger(list).unwrap();
        lc.arrived(s.id).unwrap();
        lc.answer(s.id, outcome).unwrap();
        lc.dwell_complete(s.id).unwrap();
        lc.departed(s.id).unwrap();
        s
    }

    // ── pure helpers ──────────────────────────────────────────────

    #[test]
    fn next_task_wraps() {
        let list = tasks(&["a", "b", "c"]);
        assert_eq!(next_task(&list, 0), Some(("a", 1)));
        assert_eq!(next_task(&list, 2), Some(("c", 0)));
        assert_eq!(next_task(&list, 7), Some(("b", 2)));
    }

    #[test]
    fn next_task_empty_is_none() {
        assert_eq!(next_task(&[], 0), None);
    }

    #[test]
    fn pick_side_produces_both_sides() {
        let mut rng = StdRng::seed_from_u64(42);
        let picks: Vec<Side> = (0..64).map(|_| pick_side(&mut rng)).collect();
        assert!(picks.contains(&Side::Left));
        assert!(picks.contains(&Side::Right));
    }

    // ── transitions ───────────────────────────────────────────────

    #[test]
    fn full_cycle_returns_to_idle() {
        let mut lc = lifecycle();
        let list = tasks(&["Drink water?"]);

        let s = lc.trigger(&list).unwrap();
        assert_eq!(lc.state().label(), "Entering");
        assert_eq!(s.task, "Drink water?");

        lc.arrived(s.id).unwrap();
        assert_eq!(lc.state().label(), "AwaitingResponse");

        lc.answer(s.id, Outcome::Completed).unwrap();
        assert_eq!(lc.state(), &ReminderState::Reacting(s.clone(), Outcome::Completed));

        lc.dwell_complete(s.id).unwrap();
        assert_eq!(lc.state().label(), "Exiting");

        lc.departed(s.id).unwrap();
        assert!(lc.is_idle());
        assert!(lc.session().is_none());
    }

    #[test]
    fn trigger_while_busy_is_dropped() {
        let mut lc = lifecycle();
        let list = tasks(&["a", "b"]);
        let s = lc.trigger(&list).unwrap();

        assert!(lc.trigger(&list).is_none());
        assert_eq!(lc.session(), Some(&s));

        lc.arrived(s.id);
        assert!(lc.trigger(&list).is_none());
        lc.answer(s.id, Outcome::Missed);
        assert!(lc.trigger(&list).is_none());
        lc.dwell_complete(s.id);
        assert!(lc.trigger(&list).is_none());
        assert_eq!(lc.session().unwrap().task, "a");
    }

    #[test]
    fn dropped_trigger_does_not_advance_round_robin() {
        let mut lc = lifecycle();
        let list = tasks(&["a", "b", "c"]);
        let first = lc.trigger(&list).unwrap();
        lc.trigger(&list);
        lc.trigger(&list);
        lc.cancel();
        assert_eq!(first.task, "a");
        assert_eq!(lc.trigger(&list).unwrap().task, "b");
    }

    #[test]
    fn round_robin_across_cycles() {
        let mut lc = lifecycle();
        let list = tasks(&["a", "b", "c"]);
        let picked: Vec<String> = (0..5)
            .map(|_| run_cycle(&mut lc, &list, Outcome::Completed).task)
            .collect();
        assert_eq!(picked, vec!["a", "b", "c", "a", "b"]);
    }

    #[test]
    fn round_robin_survives_shrinking_list() {
        let mut lc = lifecycle();
        run_cycle(&mut lc, &tasks(&["a", "b", "c"]), Outcome::Completed);
        run_cycle(&mut lc, &tasks(&["a", "b", "c"]), Outcome::Completed);
        // Index 2 against a two-item list wraps to the first entry.
        let s = lc.trigger(&tasks(&["x", "y"])).unwrap();
        assert_eq!(s.task, "x");
    }

    #[test]
    fn empty_tasks_do_not_start_session() {
        let mut lc = lifecycle();
        assert!(lc.trigger(&[]).is_none());
        assert!(lc.is_idle());
    }

    #[test]
    fn only_first_answer_counts() {
        let mut lc = lifecycle();
        let s = lc.trigger(&tasks(&["a"])).unwrap();
        lc.arrived(s.id);
        assert!(lc.answer(s.id, Outcome::Completed).is_some());
        assert!(lc.answer(s.id, Outcome::Missed).is_none());
        assert_eq!(lc.state(), &ReminderState::Reacting(s, Outcome::Completed));
    }

    #[test]
    fn answer_before_arrival_is_ignored() {
        let mut lc = lifecycle();
        let s = lc.trigger(&tasks(&["a"])).unwrap();
        assert!(lc.answer(s.id, Outcome::Completed).is_none());
        assert_eq!(lc.state().label(), "Entering");
    }

    #[test]
    fn stale_session_signals_are_ignored() {
        let mut lc = lifecycle();
        let list = tasks(&["a"]);
        let old = run_cycle(&mut lc, &list, Outcome::Missed);
        let current = lc.trigger(&list).unwrap();

        assert!(lc.arrived(old.id).is_none());
        assert_eq!(lc.state().label(), "Entering");
        assert!(lc.arrived(current.id).is_some());
        assert!(lc.departed(old.id).is_none());
        assert_eq!(lc.state().label(), "AwaitingResponse");
    }

    #[test]
    fn session_ids_are_unique() {
        let mut lc = lifecycle();
        let list = tasks(&["a"]);
        let a = run_cycle(&mut lc, &list, Outcome::Completed);
        let b = run_cycle(&mut lc, &list, Outcome::Completed);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn cancel_returns_live_session() {
        let mut lc = lifecycle();
        let s = lc.trigger(&tasks(&["a"])).unwrap();
        lc.arrived(s.id);
        assert_eq!(lc.cancel(), Some(s));
        assert!(lc.is_idle());
        assert!(lc.cancel().is_none());
    }

    #[test]
    fn outcome_from_answer() {
        assert!(Outcome::from_answer(true).is_completed());
        assert!(!Outcome::from_answer(false).is_completed());
    }
}
