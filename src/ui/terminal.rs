//! Headless front end for running the agent in a terminal.
//!
//! Animations are fixed delays, the prompt is answered with `y`/`n` on
//! stdin, and the red alert takes over the terminal's alternate screen for
//! a few seconds.

use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use crossterm::{
    cursor::MoveTo,
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, warn};

use super::{AnswerHandle, Presenter, SettingsEditor, Signal};
use crate::config::{ConfigStore, Settings};
use crate::constants::*;
use crate::history::HistoryEntry;
use crate::lifecycle::{Outcome, Side};
use crate::utils::{center_line, truncate_str};

/// Longest task text shown in the history table.
const HISTORY_TASK_WIDTH: usize = 48;
/// Newest entries listed by the history command.
const HISTORY_LIMIT: usize = 50;

/// The prompt waiting for a typed answer, shared with the stdin thread.
#[derive(Debug, Default)]
struct PromptSlot {
    pending: Option<AnswerHandle>,
    /// Stdin is gone; every prompt is answered No.
    closed: bool,
}

type SharedPrompt = Arc<Mutex<PromptSlot>>;

pub struct TerminalPresenter {
    store: ConfigStore,
    prompt: SharedPrompt,
}

impl TerminalPresenter {
    /// Start the stdin reader thread. The presenter's timers need a tokio
    /// runtime.
    pub fn new(store: ConfigStore) -> Self {
        let prompt = SharedPrompt::default();
        let reader_prompt = prompt.clone();
        // Not a tokio blocking task: runtime shutdown must never wait on a
        // pending read.
        let spawned = std::thread::Builder::new()
            .name("panda-stdin".to_string())
            .spawn(move || read_answers(std::io::stdin().lock(), &reader_prompt));
        if let Err(e) = spawned {
            warn!("Could not start stdin reader: {}", e);
            close_prompts(&prompt);
        }
        Self::with_prompt(store, prompt)
    }

    fn with_prompt(store: ConfigStore, prompt: SharedPrompt) -> Self {
        Self { store, prompt }
    }
}

/// Route every line of `input` to the waiting prompt until end of input.
fn read_answers<R: BufRead>(input: R, prompt: &SharedPrompt) {
    for line in input.lines() {
        match line {
            Ok(line) => route_answer(prompt, &line),
            Err(e) => {
                debug!("stdin read failed: {}", e);
                break;
            }
        }
    }
    warn!("stdin closed; reminders will be answered No from now on");
    close_prompts(prompt);
}

/// Hand a typed line to the waiting prompt, if any.
fn route_answer(prompt: &SharedPrompt, line: &str) {
    let Ok(mut slot) = prompt.lock() else {
        return;
    };
    match parse_answer(line) {
        Some(yes) => {
            if let Some(handle) = slot.pending.take() {
                handle.answer(Outcome::from_answer(yes));
            }
        }
        None if slot.pending.is_some() => println!("  Please answer y or n."),
        None => {}
    }
}

/// Mark input as gone and release the open prompt, if any.
fn close_prompts(prompt: &SharedPrompt) {
    let Ok(mut slot) = prompt.lock() else {
        return;
    };
    slot.closed = true;
    if let Some(handle) = slot.pending.take() {
        handle.no();
    }
}

/// `Some(true)` for yes, `Some(false)` for no.
fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

fn side_name(side: Side) -> &'static str {
    match side {
        Side::Left => "left",
        Side::Right => "right",
    }
}

/// Totals line followed by the newest entries, newest first.
fn history_lines(entries: &[HistoryEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No reminders answered yet.".to_string()];
    }
    let completed = entries.iter().filter(|e| e.completed).count();
    let mut lines = vec![
        format!(
            "Completed: {}  |  Missed: {}",
            completed,
            entries.len() - completed
        ),
        format!("{:<19}  {:<4}  Task", "When", "Done"),
    ];
    for entry in entries.iter().rev().take(HISTORY_LIMIT) {
        lines.push(format!(
            "{:<19}  {:<4}  {}",
            entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            if entry.completed { "yes" } else { "no" },
            truncate_str(&entry.task, HISTORY_TASK_WIDTH)
        ));
    }
    if entries.len() > HISTORY_LIMIT {
        lines.push(format!("(newest {} of {})", HISTORY_LIMIT, entries.len()));
    }
    lines
}

/// Fire `signal` after `delay` without blocking the caller.
fn fire_after(delay: Duration, signal: Signal) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        signal.fire();
    });
}

/// Draw the alert on the alternate screen.
fn draw_alert(message: &str) -> std::io::Result<()> {
    let (cols, rows) = terminal::size().unwrap_or((80, 24));
    let width = cols as usize;
    let lines = textwrap::wrap(message, width.saturating_sub(8).max(10));
    let top = (rows as usize).saturating_sub(lines.len() + 2) / 2;

    let mut out = std::io::stdout();
    execute!(out, EnterAlternateScreen)?;
    queue!(
        out,
        SetBackgroundColor(Color::DarkRed),
        SetForegroundColor(Color::White),
        Clear(ClearType::All),
        SetAttribute(Attribute::Bold),
        MoveTo(0, top as u16),
        Print(center_line("!!! RED ALERT !!!", width)),
    )?;
    for (i, line) in lines.iter().enumerate() {
        queue!(
            out,
            MoveTo(0, (top + 2 + i) as u16),
            Print(center_line(line, width))
        )?;
    }
    queue!(out, SetAttribute(Attribute::Reset))?;
    out.flush()
}

fn clear_alert() -> std::io::Result<()> {
    execute!(std::io::stdout(), ResetColor, LeaveAlternateScreen)
}

impl Presenter for TerminalPresenter {
    fn animate(&mut self, side: Side, arrived: Signal) {
        println!("\n🐼 The panda dashes in from the {}...", side_name(side));
        fire_after(Duration::from_millis(ENTER_ANIMATION_MS), arrived);
    }

    fn animate_exit(&mut self, side: Side, left: Signal) {
        println!("🐼 ...and runs off to the {}.", side_name(side));
        fire_after(Duration::from_millis(EXIT_ANIMATION_MS), left);
    }

    fn react(&mut self, outcome: Outcome, dwell_complete: Signal) {
        match outcome {
            Outcome::Completed => println!("🐼 Yay! Good job!"),
            Outcome::Missed => println!("🐼 Hmph. Next time, then."),
        }
        fire_after(Duration::from_millis(REACT_DWELL_MS), dwell_complete);
    }

    fn present_prompt(&mut self, task: &str, answer: AnswerHandle) {
        println!("🐼 {} [y/n]", task);
        let Ok(mut slot) = self.prompt.lock() else {
            return;
        };
        if slot.closed {
            println!("  (no input available; answering n)");
            answer.no();
        } else {
            slot.pending = Some(answer);
        }
    }

    fn present_full_screen_alert(&mut self, message: &str, dismissed: Signal) {
        if let Err(e) = draw_alert(message) {
            debug!("Alternate screen unavailable ({}); printing alert", e);
            let _ = clear_alert();
            println!("\n!!! RED ALERT !!!\n{}\n", message);
        }
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(ALERT_DISPLAY_SECS)).await;
            let _ = clear_alert();
            dismissed.fire();
        });
    }

    fn open_settings(&mut self, current: &Settings, editor: SettingsEditor) {
        let path = self.store.settings_path();
        println!("Settings file: {}", path.display());
        if !path.exists() {
            if let Err(e) = self.store.save(current) {
                warn!("Could not create {}: {}", path.display(), e);
            }
        }
        match serde_json::to_string_pretty(current) {
            Ok(json) => println!("{}", json),
            Err(e) => debug!("Could not render settings: {}", e),
        }

        // Hand edits to the file are the confirmed edit.
        match self.store.try_load() {
            Ok(on_disk) if on_disk != *current => {
                println!("Applying changes from the settings file.");
                editor.confirm(on_disk);
            }
            Ok(_) => println!("Edit the file and run `panda settings` again to apply changes."),
            Err(e) => println!("Settings file not applied: {}", e),
        }
    }

    fn show_history(&mut self, entries: &[HistoryEntry]) {
        for line in history_lines(entries) {
            println!("{}", line);
        }
    }

    fn notify(&mut self, title: &str, body: &str) {
        println!("[{}] {}", title, body);
    }
}
