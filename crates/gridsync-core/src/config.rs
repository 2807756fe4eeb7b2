//! TOML-based application configuration.
//!
//! Stores:
//! - Target calendar (name, owner to share with, description, timezone)
//! - Session durations per kind (the schedule source only publishes start
//!   times)
//! - Schedule source endpoint and request timeout
//! - Per-run settings (wall-clock budget, past-session handling)
//!
//! Configuration is stored at `~/.config/gridsync/config.toml`.
//! Set `GRIDSYNC_ENV=dev` to use `~/.config/gridsync-dev/` instead.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schedule::SessionKind;

/// Target calendar configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Calendar summary to find or create in the store.
    #[serde(default = "default_calendar_name")]
    pub name: String,
    /// Email the calendar is shared with after creation (optional).
    #[serde(default)]
    pub owner_email: Option<String>,
    #[serde(default = "default_calendar_description")]
    pub description: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

/// Fixed session durations, in minutes. The schedule source publishes only
/// start times; end times are derived from these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationsConfig {
    #[serde(default = "default_race_minutes")]
    pub race_minutes: u32,
    #[serde(default = "default_session_minutes")]
    pub qualifying_minutes: u32,
    #[serde(default = "default_session_minutes")]
    pub sprint_minutes: u32,
    #[serde(default = "default_session_minutes")]
    pub sprint_qualifying_minutes: u32,
}

impl DurationsConfig {
    pub fn minutes_for(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Race => self.race_minutes,
            SessionKind::Qualifying => self.qualifying_minutes,
            SessionKind::Sprint => self.sprint_minutes,
            SessionKind::SprintQualifying => self.sprint_qualifying_minutes,
        }
    }
}

/// Schedule source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Per-run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Wall-clock budget for one sync pass. Once exceeded, in-flight store
    /// calls finish but no new ones are started. 0 disables the budget.
    #[serde(default = "default_run_timeout_secs")]
    pub timeout_secs: u64,
    /// Sync sessions whose start time is already in the past.
    #[serde(default)]
    pub include_past: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/gridsync/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub durations: DurationsConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub run: RunConfig,
}

// Default functions
fn default_calendar_name() -> String {
    "Formula 1".into()
}
fn default_calendar_description() -> String {
    "Formula 1 races, qualifying, and sprint sessions automatically synced".into()
}
fn default_time_zone() -> String {
    "UTC".into()
}
fn default_race_minutes() -> u32 {
    120
}
fn default_session_minutes() -> u32 {
    60
}
fn default_api_base() -> String {
    "https://f1api.dev/api/current".into()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_run_timeout_secs() -> u64 {
    300
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            name: default_calendar_name(),
            owner_email: None,
            description: default_calendar_description(),
            time_zone: default_time_zone(),
        }
    }
}

impl Default for DurationsConfig {
    fn default() -> Self {
        Self {
            race_minutes: default_race_minutes(),
            qualifying_minutes: default_session_minutes(),
            sprint_minutes: default_session_minutes(),
            sprint_qualifying_minutes: default_session_minutes(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_run_timeout_secs(),
            include_past: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calendar: CalendarConfig::default(),
            durations: DurationsConfig::default(),
            source: SourceConfig::default(),
            run: RunConfig::default(),
        }
    }
}

/// Returns `~/.config/gridsync[-dev]/` based on GRIDSYNC_ENV.
pub fn config_dir() -> PathBuf {
    let base = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    match std::env::var("GRIDSYNC_ENV").as_deref() {
        Ok("dev") => base.join("gridsync-dev"),
        _ => base.join("gridsync"),
    }
}

impl Config {
    pub fn path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Load from the default path, writing defaults on first run.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path())
    }

    /// Load, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.calendar.name, "Formula 1");
        assert_eq!(parsed.durations.race_minutes, 120);
        assert_eq!(parsed.source.api_base, "https://f1api.dev/api/current");
        assert_eq!(parsed.run.timeout_secs, 300);
        assert!(!parsed.run.include_past);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.durations.qualifying_minutes, 60);
        assert!(parsed.calendar.owner_email.is_none());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [calendar]
            name = "My F1"
            owner_email = "me@example.com"

            [durations]
            race_minutes = 150
            "#,
        )
        .unwrap();
        assert_eq!(parsed.calendar.name, "My F1");
        assert_eq!(parsed.calendar.owner_email.as_deref(), Some("me@example.com"));
        assert_eq!(parsed.durations.race_minutes, 150);
        assert_eq!(parsed.durations.sprint_minutes, 60);
    }

    #[test]
    fn minutes_for_maps_every_kind() {
        let durations = DurationsConfig::default();
        assert_eq!(durations.minutes_for(SessionKind::Race), 120);
        assert_eq!(durations.minutes_for(SessionKind::Qualifying), 60);
        assert_eq!(durations.minutes_for(SessionKind::Sprint), 60);
        assert_eq!(durations.minutes_for(SessionKind::SprintQualifying), 60);
    }

    #[test]
    fn load_from_missing_path_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.calendar.name, "Formula 1");
        assert!(path.exists());

        // Second load reads the file that was just written.
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.source.request_timeout_secs, 10);
    }

    #[test]
    fn load_from_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "calendar = 3").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
