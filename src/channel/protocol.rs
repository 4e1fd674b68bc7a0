//! # Channel Protocol
//!
//! Payload is a single UTF-8 token terminated by end of stream; the reply is
//! the fixed acknowledgement [`CHANNEL_ACK`](crate::constants::CHANNEL_ACK).

use std::fmt;
use std::str::FromStr;

use crate::error::PandaError;

/// Commands a client can hand to the running instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Command {
    /// Show a reminder now
    Show,
    /// Open the settings editor
    Settings,
    /// Show the reminder history
    History,
    /// Trigger the full-screen alert
    #[value(name = "redalert")]
    RedAlert,
}

impl Command {
    pub const ALL: [Command; 4] = [
        Command::Show,
        Command::Settings,
        Command::History,
        Command::RedAlert,
    ];

    /// Wire token for this command.
    pub fn token(&self) -> &'static str {
        match self {
            Command::Show => "show",
            Command::Settings => "settings",
            Command::History => "history",
            Command::RedAlert => "redalert",
        }
    }

    /// Decode a raw payload. Surrounding whitespace is ignored.
    pub fn from_payload(bytes: &[u8]) -> Result<Self, PandaError> {
        String::from_utf8_lossy(bytes).parse()
    }
}

impl FromStr for Command {
    type Err = PandaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Command::ALL
            .into_iter()
            .find(|c| c.token() == token)
            .ok_or_else(|| PandaError::InvalidCommand(token.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
