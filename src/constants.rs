//! Application-wide constants.
//!
//! Centralizes timings, defaults, and file locations so the scheduler,
//! channel, and front end agree on them.

use std::path::PathBuf;

// ── Identity ──────────────────────────────────────────────────────
/// Directory / socket stem shared by every path the app touches.
pub const APP_ID: &str = "hit-and-run-panda";
/// Human-readable product name.
pub const APP_NAME: &str = "Hit & Run Panda";

// ── Interval units (milliseconds) ─────────────────────────────────
pub const MILLIS_PER_SECOND: u64 = 1_000;
pub const MILLIS_PER_MINUTE: u64 = 60_000;
pub const MILLIS_PER_HOUR: u64 = 3_600_000;
pub const MILLIS_PER_DAY: u64 = 86_400_000;

// ── Settings defaults ─────────────────────────────────────────────
/// Default reminder interval value (paired with `DEFAULT_PANDA_UNIT`).
pub const DEFAULT_PANDA_VALUE: u64 = 30;
pub const DEFAULT_PANDA_UNIT: &str = "seconds";
/// Default alert interval value (paired with `DEFAULT_ALERT_UNIT`).
pub const DEFAULT_ALERT_VALUE: u64 = 1;
pub const DEFAULT_ALERT_UNIT: &str = "hours";
pub const DEFAULT_ALERT_MESSAGE: &str = "DRINK WATER NOW!";
pub const DEFAULT_TASKS: &[&str] = &[
    "Did you drink water?",
    "Time to stretch!",
    "Take a quick break?",
    "Check your posture!",
    "Rest your eyes for 20 seconds?",
];

// ── Command channel ───────────────────────────────────────────────
/// Fixed acknowledgement the server writes back for every command.
pub const CHANNEL_ACK: &[u8; 2] = b"ok";
/// How long the server waits for a client to finish sending its token.
pub const CHANNEL_READ_TIMEOUT_MS: u64 = 1000;
/// How long a client waits to connect and again for the acknowledgement.
pub const CHANNEL_CLIENT_TIMEOUT_MS: u64 = 1000;
/// Upper bound on bytes read for a single command token.
pub const MAX_COMMAND_BYTES: u64 = 64;

// ── Terminal front end timings ────────────────────────────────────
/// Simulated walk-on time before the prompt appears.
pub const ENTER_ANIMATION_MS: u64 = 800;
/// Fixed dwell after an answer before the panda leaves.
pub const REACT_DWELL_MS: u64 = 1500;
/// Simulated walk-off time.
pub const EXIT_ANIMATION_MS: u64 = 800;
/// How long the full-screen alert stays up.
pub const ALERT_DISPLAY_SECS: u64 = 5;

// ── Operator notifications ────────────────────────────────────────
/// Minimum interval between notifications of the same kind (seconds).
pub const NOTIFY_RATE_LIMIT_SECS: u64 = 300;

// ── Paths ─────────────────────────────────────────────────────────

/// Returns the user's home directory, falling back to /tmp.
pub fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()))
}

/// Returns `$PANDA_CONFIG_DIR`, or `~/.config/hit-and-run-panda/`.
pub fn config_dir() -> PathBuf {
    match std::env::var("PANDA_CONFIG_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home_dir().join(".config").join(APP_ID),
    }
}

/// Returns `<config_dir>/.env` (optional path overrides).
pub fn env_file_path() -> PathBuf {
    config_dir().join(".env")
}

/// Settings file name inside the config directory.
pub const SETTINGS_FILE: &str = "settings.json";
/// History file name inside the config directory.
pub const HISTORY_FILE: &str = "history.json";

/// Resolve the well-known channel path.
///
/// `$PANDA_SOCKET` wins, then `$XDG_RUNTIME_DIR`, then a per-user path in /tmp.
pub fn socket_path() -> PathBuf {
    if let Ok(path) = std::env::var("PANDA_SOCKET") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    if let Ok(runtime) = std::env::var("XDG_RUNTIME_DIR") {
        if !runtime.is_empty() {
            return PathBuf::from(runtime).join(format!("{}.sock", APP_ID));
        }
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "default".to_string());
    PathBuf::from("/tmp").join(format!("{}-{}.sock", APP_ID, user))
}
