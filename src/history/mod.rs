//! Append-only log of resolved reminders, persisted as a JSON array.
//!
//! Every append reads the current file, pushes one entry, and rewrites the
//! whole array through [`write_atomic`], so a crash leaves either the old
//! array or the new one on disk, never a torn entry. A file that fails to
//! parse is set aside as `history.json.corrupt` before being replaced.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PandaError, Result};
use crate::utils::write_atomic;

/// One resolved reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub task: String,
    pub completed: bool,
    /// Serialized as an ISO-8601 / RFC 3339 string.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries oldest first. Missing or malformed files read as empty.
    pub fn read(&self) -> Vec<HistoryEntry> {
        match self.try_read() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("{}. Treating history as empty.", e);
                Vec::new()
            }
        }
    }

    /// I/O failures are [`PandaError::Persistence`]; only unparseable
    /// content is [`PandaError::Config`].
    fn try_read(&self) -> Result<Vec<HistoryEntry>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PandaError::persistence(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| PandaError::Config {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Append an entry stamped with the current time.
    pub fn append(&self, task: &str, completed: bool) -> Result<HistoryEntry> {
        self.append_entry(HistoryEntry {
            task: task.to_string(),
            completed,
            timestamp: Utc::now(),
        })
    }

    /// Append a fully formed entry.
    pub fn append_entry(&self, entry: HistoryEntry) -> Result<HistoryEntry> {
        let mut entries = match self.try_read() {
            Ok(entries) => entries,
            Err(e @ PandaError::Config { .. }) => {
                warn!("{}. Starting a fresh history.", e);
                self.quarantine();
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        entries.push(entry.clone());

        let json = serde_json::to_vec_pretty(&entries)
            .map_err(|e| PandaError::persistence(&self.path, std::io::Error::other(e)))?;
        write_atomic(&self.path, &json).map_err(|e| PandaError::persistence(&self.path, e))?;
        debug!(
            "History: {:?} completed={} ({} entries)",
            entry.task,
            entry.completed,
            entries.len()
        );
        Ok(entry)
    }

    /// Move an unreadable log aside so appending does not destroy it.
    fn quarantine(&self) {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        if let Err(e) = std::fs::rename(&self.path, PathBuf::from(name)) {
            debug!("Could not set aside {}: {}", self.path.display(), e);
        }
    }
}
