//! Raw schedule records as published by the F1 schedule API.
//!
//! Field names follow the f1api.dev `/api/current` payload. Everything is
//! optional at this layer; required-field validation happens in
//! [`extract`], which turns one raw weekend into normalized sessions.

use serde::{Deserialize, Deserializer, Serialize};

pub mod extract;

pub use extract::{extract_sessions, parse_session_time, Session, SessionKind, WeekendId};

/// The full current-season payload: season year plus one record per race
/// weekend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonSchedule {
    #[serde(default, deserialize_with = "u16_or_string")]
    pub season: Option<u16>,
    #[serde(default)]
    pub races: Vec<RawWeekend>,
}

/// One raw race-weekend record.
///
/// `season` is usually absent per record; the schedule source stamps the
/// envelope's season onto each record after parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWeekend {
    #[serde(default, deserialize_with = "u32_or_string")]
    pub round: Option<u32>,
    #[serde(default, deserialize_with = "u16_or_string")]
    pub season: Option<u16>,
    #[serde(default)]
    pub race_name: Option<String>,
    #[serde(default)]
    pub circuit: Option<RawCircuit>,
    #[serde(default)]
    pub schedule: RawSchedule,
}

impl RawWeekend {
    /// Race name with a trailing year stripped ("Monaco Grand Prix 2026"
    /// becomes "Monaco Grand Prix").
    pub fn display_name(&self) -> String {
        let raw = self.race_name.as_deref().unwrap_or("Grand Prix").trim();
        match raw.rsplit_once(' ') {
            Some((name, tail)) if tail.len() == 4 && tail.chars().all(|c| c.is_ascii_digit()) => {
                name.to_string()
            }
            _ => raw.to_string(),
        }
    }

    /// "City, Country" from the circuit record, dropping missing halves.
    pub fn location(&self) -> String {
        let Some(circuit) = &self.circuit else {
            return String::new();
        };
        let parts: Vec<&str> = [circuit.city.as_deref(), circuit.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        parts.join(", ")
    }
}

/// Circuit details attached to a weekend record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCircuit {
    #[serde(default)]
    pub circuit_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// The per-weekend session timetable. Only the four synced kinds are
/// materialized; anything else in the payload (practice sessions, unknown
/// future kinds) is ignored by construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchedule {
    #[serde(default)]
    pub race: Option<RawTimestamp>,
    #[serde(default)]
    pub qualy: Option<RawTimestamp>,
    #[serde(default)]
    pub sprint_race: Option<RawTimestamp>,
    #[serde(default)]
    pub sprint_qualy: Option<RawTimestamp>,
}

impl RawSchedule {
    pub fn slot(&self, kind: SessionKind) -> Option<&RawTimestamp> {
        match kind {
            SessionKind::Race => self.race.as_ref(),
            SessionKind::Qualifying => self.qualy.as_ref(),
            SessionKind::Sprint => self.sprint_race.as_ref(),
            SessionKind::SprintQualifying => self.sprint_qualy.as_ref(),
        }
    }
}

/// A session start instant split into date and time strings, as the API
/// publishes it ("2026-03-08" + "04:00:00Z").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTimestamp {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

// The API is inconsistent about numeric fields: round/season arrive as
// numbers or strings depending on endpoint version.
fn u32_or_string<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

fn u16_or_string<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}
