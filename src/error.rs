//! Error types for the reminder core.

use std::path::PathBuf;

/// Every failure the core can report.
///
/// None of these terminate a running server; callers recover locally,
/// report to the operator, or fall back to client mode.
#[derive(Debug, thiserror::Error)]
pub enum PandaError {
    /// Persisted settings or history could not be parsed.
    #[error("config error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// A settings or history file could not be read or written.
    #[error("could not access {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A settings edit was refused at the store boundary.
    #[error("settings rejected: {0}")]
    InvalidSettings(String),

    /// Another live instance already owns the command channel.
    #[error("another instance is already listening on {0}")]
    ChannelBind(PathBuf),

    /// No server answered within the client timeout.
    #[error("no running instance answered on {0}")]
    ChannelTimeout(PathBuf),

    /// The server answered with something other than the acknowledgement.
    #[error("unexpected reply from running instance: {0:?}")]
    UnexpectedReply(String),

    /// Token did not name a known command.
    #[error("unrecognized command: {0:?}")]
    InvalidCommand(String),

    /// Channel socket I/O error outside the cases above.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PandaError {
    /// Wrap an I/O failure on `path` as a persistence error.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, PandaError>;
