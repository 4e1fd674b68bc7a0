use std::path::PathBuf;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::*;
use crate::error::{PandaError, Result};
use crate::history::{HistoryEntry, HistoryLog};

/// Unit half of a `(value, unit)` interval.
///
/// Unknown unit strings are kept verbatim so they survive a rewrite, and
/// time out with the seconds multiplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Other(String),
}

impl TimeUnit {
    pub fn as_str(&self) -> &str {
        match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Other(s) => s,
        }
    }

    /// Milliseconds in one of this unit.
    pub fn millis(&self) -> u64 {
        unit_to_millis(self.as_str())
    }
}

impl From<String> for TimeUnit {
    fn from(s: String) -> Self {
        match s.as_str() {
            "seconds" => TimeUnit::Seconds,
            "minutes" => TimeUnit::Minutes,
            "hours" => TimeUnit::Hours,
            "days" => TimeUnit::Days,
            _ => TimeUnit::Other(s),
        }
    }
}

impl From<&str> for TimeUnit {
    fn from(s: &str) -> Self {
        TimeUnit::from(s.to_string())
    }
}

impl From<TimeUnit> for String {
    fn from(unit: TimeUnit) -> Self {
        match unit {
            TimeUnit::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// Milliseconds per unit name. Unrecognized names use the seconds multiplier.
pub fn unit_to_millis(unit: &str) -> u64 {
    match unit {
        "seconds" => MILLIS_PER_SECOND,
        "minutes" => MILLIS_PER_MINUTE,
        "hours" => MILLIS_PER_HOUR,
        "days" => MILLIS_PER_DAY,
        _ => MILLIS_PER_SECOND,
    }
}

/// A user-facing `(value, unit)` interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSetting {
    pub value: u64,
    pub unit: TimeUnit,
}

impl IntervalSetting {
    pub fn new(value: u64, unit: impl Into<TimeUnit>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    /// `value × unit_to_millis(unit)`, saturating on overflow.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.value.saturating_mul(self.unit.millis()))
    }
}

/// User settings, persisted as `settings.json`.
///
/// Keys the app does not recognise are carried in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub panda_enabled: bool,
    pub panda_interval: IntervalSetting,
    pub tasks: Vec<String>,
    pub alert_enabled: bool,
    pub alert_interval: IntervalSetting,
    pub alert_message: String,
    pub first_run: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            panda_enabled: false,
            panda_interval: IntervalSetting::new(DEFAULT_PANDA_VALUE, DEFAULT_PANDA_UNIT),
            tasks: DEFAULT_TASKS.iter().map(|t| t.to_string()).collect(),
            alert_enabled: false,
            alert_interval: IntervalSetting::new(DEFAULT_ALERT_VALUE, DEFAULT_ALERT_UNIT),
            alert_message: DEFAULT_ALERT_MESSAGE.to_string(),
            first_run: true,
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Check an edit before it is accepted.
    ///
    /// Reminders cannot be enabled without at least one task, and no task
    /// may be blank.
    pub fn validate(&self) -> Result<()> {
        if self.tasks.iter().any(|t| t.trim().is_empty()) {
            return Err(PandaError::InvalidSettings(
                "tasks must not contain blank entries".to_string(),
            ));
        }
        if self.panda_enabled && self.tasks.is_empty() {
            return Err(PandaError::InvalidSettings(
                "at least one task is required while reminders are enabled".to_string(),
            ));
        }
        if (self.panda_enabled && self.panda_interval.value == 0)
            || (self.alert_enabled && self.alert_interval.value == 0)
        {
            return Err(PandaError::InvalidSettings(
                "enabled intervals must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Merge a parsed settings object over the compiled defaults.
    ///
    /// Missing or wrongly typed known keys keep their default; every other
    /// key lands in `extra`. An empty task list or a zero interval is kept
    /// as written unless its timer is enabled, so anything
    /// [`validate`](Self::validate) accepts loads back unchanged.
    pub fn from_object(mut object: Map<String, Value>) -> Self {
        let mut settings = Settings::default();

        if let Some(v) = take::<bool>(&mut object, "panda_enabled") {
            settings.panda_enabled = v;
        }
        if let Some(v) = take::<FileInterval>(&mut object, "panda_interval") {
            v.merge_into(&mut settings.panda_interval);
        }
        if let Some(v) = take::<Vec<String>>(&mut object, "tasks") {
            settings.tasks = v.into_iter().filter(|t| !t.trim().is_empty()).collect();
        }
        if let Some(v) = take::<bool>(&mut object, "alert_enabled") {
            settings.alert_enabled = v;
        }
        if let Some(v) = take::<FileInterval>(&mut object, "alert_interval") {
            v.merge_into(&mut settings.alert_interval);
        }
        if let Some(v) = take::<String>(&mut object, "alert_message") {
            settings.alert_message = v;
        }
        if let Some(v) = take::<bool>(&mut object, "first_run") {
            settings.first_run = v;
        }

        if settings.panda_enabled && settings.tasks.is_empty() {
            warn!("Reminders enabled with no tasks; using the default tasks");
            settings.tasks = Settings::default().tasks;
        }
        if settings.panda_enabled {
            settings.panda_interval.value = settings.panda_interval.value.max(1);
        }
        if settings.alert_enabled {
            settings.alert_interval.value = settings.alert_interval.value.max(1);
        }

        settings.extra = object;
        settings
    }
}

/// Interval as found on disk; either half may be missing.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileInterval {
    value: Option<u64>,
    unit: Option<TimeUnit>,
}

impl FileInterval {
    fn merge_into(self, interval: &mut IntervalSetting) {
        if let Some(v) = self.value {
            interval.value = v;
        }
        if let Some(u) = self.unit {
            interval.unit = u;
        }
    }
}

/// Remove `key` from `object` and decode it, dropping values of the wrong type.
fn take<T: DeserializeOwned>(object: &mut Map<String, Value>, key: &str) -> Option<T> {
    let raw = object.remove(key)?;
    match serde_json::from_value(raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Ignoring settings key {:?}: {}. Using default.", key, e);
            None
        }
    }
}

/// Owns the settings file and the history log in one config directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
    history: HistoryLog,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let history = HistoryLog::new(dir.join(HISTORY_FILE));
        Self { dir, history }
    }

    /// Store rooted at the default config directory.
    pub fn open_default() -> Self {
        Self::new(config_dir())
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Load settings, falling back to defaults for anything missing or
    /// malformed. Never fails.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{}. Using defaults.", e);
                Settings::default()
            }
        }
    }

    /// Like [`load`](Self::load) but surfaces a malformed file as
    /// [`PandaError::Config`]. A missing file is not an error.
    pub fn try_load(&self) -> Result<Settings> {
        let path = self.settings_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}; using defaults", path.display());
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(PandaError::Config {
                    path,
                    reason: e.to_string(),
                })
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(object)) => Ok(Settings::from_object(object)),
            Ok(_) => Err(PandaError::Config {
                path,
                reason: "expected a JSON object".to_string(),
            }),
            Err(e) => Err(PandaError::Config {
                path,
                reason: e.to_string(),
            }),
        }
    }

    /// Overwrite the settings file atomically.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let path = self.settings_path();
        let json = serde_json::to_vec_pretty(settings)
            .map_err(|e| PandaError::persistence(&path, std::io::Error::other(e)))?;
        crate::utils::write_atomic(&path, &json).map_err(|e| PandaError::persistence(&path, e))?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Append one resolved reminder to the history log.
    pub fn append_history(&self, task: &str, completed: bool) -> Result<HistoryEntry> {
        self.history.append(task, completed)
    }

    /// All history entries, oldest first.
    pub fn read_history(&self) -> Vec<HistoryEntry> {
        self.history.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        (dir, store)
    }

    // ── unit_to_millis ────────────────────────────────────────────

    #[test]
    fn unit_table_is_exact() {
        assert_eq!(unit_to_millis("seconds"), 1_000);
        assert_eq!(unit_to_millis("minutes"), 60_000);
        assert_eq!(unit_to_millis("hours"), 3_600_000);
        assert_eq!(unit_to_millis("days"), 86_400_000);
    }

    #[test]
    fn unknown_unit_uses_seconds() {
        assert_eq!(unit_to_millis("fortnights"), 1_000);
        assert_eq!(unit_to_millis(""), 1_000);
        assert_eq!(TimeUnit::from("weeks").millis(), 1_000);
    }

    #[test]
    fn interval_period_multiplies() {
        let interval = IntervalSetting::new(3, "minutes");
        assert_eq!(interval.period(), Duration::from_millis(180_000));
    }

    #[test]
    fn interval_period_saturates() {
        let interval = IntervalSetting::new(u64::MAX, "days");
        assert_eq!(interval.period(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn unknown_unit_string_is_preserved() {
        let unit: TimeUnit = serde_json::from_value(json!("weeks")).unwrap();
        assert_eq!(unit, TimeUnit::Other("weeks".to_string()));
        assert_eq!(serde_json::to_value(&unit).unwrap(), json!("weeks"));
    }

    // ── load / save ───────────────────────────────────────────────

    #[test]
    fn missing_file_yields_defaults() {
        let (_dir, store) = store();
        assert_eq!(store.load(), Settings::default());
        assert!(store.try_load().is_ok());
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let (_dir, store) = store();
        std::fs::write(store.settings_path(), "{ not json").unwrap();
        assert!(matches!(store.try_load(), Err(PandaError::Config { .. })));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn non_object_file_yields_defaults() {
        let (_dir, store) = store();
        std::fs::write(store.settings_path(), "[1, 2, 3]").unwrap();
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_dir, store) = store();
        let mut settings = Settings {
            panda_enabled: false,
            panda_interval: IntervalSetting::new(45, "seconds"),
            tasks: vec!["Stand up?".to_string(), "Blink?".to_string()],
            alert_enabled: true,
            alert_interval: IntervalSetting::new(1, "days"),
            alert_message: "GO OUTSIDE".to_string(),
            first_run: false,
            extra: Map::new(),
        };
        settings.extra.insert("theme".to_string(), json!("bamboo"));

        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn missing_key_takes_default_and_keeps_others() {
        let (_dir, store) = store();
        std::fs::write(
            store.settings_path(),
            json!({
                "panda_enabled": false,
                "tasks": ["Posture?"],
                "alert_message": "hey"
            })
            .to_string(),
        )
        .unwrap();

        let loaded = store.load();
        let defaults = Settings::default();
        assert!(!loaded.panda_enabled);
        assert_eq!(loaded.tasks, vec!["Posture?".to_string()]);
        assert_eq!(loaded.alert_message, "hey");
        assert_eq!(loaded.panda_interval, defaults.panda_interval);
        assert_eq!(loaded.alert_interval, defaults.alert_interval);
        assert_eq!(loaded.first_run, defaults.first_run);
    }

    #[test]
    fn unknown_keys_survive_rewrite() {
        let (_dir, store) = store();
        std::fs::write(
            store.settings_path(),
            json!({ "first_run": false, "window_x": 120, "skin": { "name": "red" } }).to_string(),
        )
        .unwrap();

        let loaded = store.load();
        store.save(&loaded).unwrap();

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(store.settings_path()).unwrap()).unwrap();
        assert_eq!(raw["window_x"], json!(120));
        assert_eq!(raw["skin"]["name"], json!("red"));
        assert_eq!(raw["first_run"], json!(false));
    }

    #[test]
    fn wrongly_typed_key_falls_back() {
        let object = json!({ "panda_enabled": "yes", "alert_enabled": true })
            .as_object()
            .cloned()
            .unwrap();
        let settings = Settings::from_object(object);
        assert_eq!(settings.panda_enabled, Settings::default().panda_enabled);
        assert!(settings.alert_enabled);
        assert!(settings.extra.is_empty());
    }

    #[test]
    fn partial_interval_merges_over_default() {
        let object = json!({
            "panda_interval": { "value": 10 },
            "alert_enabled": true,
            "alert_interval": { "value": 0, "unit": "minutes" }
        })
            .as_object()
            .cloned()
            .unwrap();
        let settings = Settings::from_object(object);
        assert_eq!(settings.panda_interval, IntervalSetting::new(10, DEFAULT_PANDA_UNIT));
        assert_eq!(settings.alert_interval, IntervalSetting::new(1, "minutes"));
    }

    #[test]
    fn empty_task_list_falls_back_when_enabled() {
        let object = json!({ "panda_enabled": true, "tasks": [] }).as_object().cloned().unwrap();
        assert_eq!(Settings::from_object(object).tasks, Settings::default().tasks);
    }

    #[test]
    fn disabled_timers_keep_empty_tasks_and_zero_values() {
        let object = json!({
            "panda_enabled": false,
            "tasks": [],
            "panda_interval": { "value": 0, "unit": "seconds" },
            "alert_enabled": false,
            "alert_interval": { "value": 0, "unit": "minutes" }
        })
        .as_object()
        .cloned()
        .unwrap();
        let settings = Settings::from_object(object);
        assert!(settings.tasks.is_empty());
        assert_eq!(settings.panda_interval.value, 0);
        assert_eq!(settings.alert_interval.value, 0);
    }

    #[test]
    fn accepted_edge_values_round_trip() {
        let (_dir, store) = store();
        let settings = Settings {
            panda_enabled: false,
            panda_interval: IntervalSetting::new(0, "seconds"),
            tasks: Vec::new(),
            alert_enabled: false,
            alert_interval: IntervalSetting::new(0, "minutes"),
            first_run: false,
            ..Settings::default()
        };
        settings.validate().unwrap();

        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn save_to_unwritable_path_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not dir").unwrap();
        let store = ConfigStore::new(blocker.join("sub"));
        let err = store.save(&Settings::default()).unwrap_err();
        assert!(matches!(err, PandaError::Persistence { .. }));
    }

    // ── validate ──────────────────────────────────────────────────

    #[test]
    fn validate_rejects_empty_tasks_when_enabled() {
        let settings = Settings {
            panda_enabled: true,
            tasks: Vec::new(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(PandaError::InvalidSettings(_))));
    }

    #[test]
    fn validate_allows_empty_tasks_when_disabled() {
        let settings = Settings {
            panda_enabled: false,
            tasks: Vec::new(),
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_interval_when_enabled() {
        let settings = Settings {
            alert_enabled: true,
            alert_interval: IntervalSetting::new(0, "minutes"),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
        let disabled = Settings {
            alert_enabled: false,
            ..settings
        };
        assert!(disabled.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_task() {
        let settings = Settings {
            tasks: vec!["Water?".to_string(), "   ".to_string()],
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
