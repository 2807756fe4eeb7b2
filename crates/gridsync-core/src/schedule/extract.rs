//! Session extraction: one raw weekend record becomes 0-4 normalized
//! sessions.
//!
//! A session is emitted for each recognized kind that carries a non-null
//! timestamp. A record that cannot be keyed (no round, no season) fails
//! with [`MalformedRecordError`]; a single bad timestamp only skips that
//! one session.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::DurationsConfig;
use crate::error::MalformedRecordError;
use crate::schedule::RawWeekend;

/// The four synced session kinds. Practice sessions are never extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    Race,
    Qualifying,
    Sprint,
    SprintQualifying,
}

impl SessionKind {
    pub const ALL: [SessionKind; 4] = [
        SessionKind::Race,
        SessionKind::Qualifying,
        SessionKind::Sprint,
        SessionKind::SprintQualifying,
    ];

    /// Human-readable label used in event titles.
    pub fn label(&self) -> &'static str {
        match self {
            SessionKind::Race => "Race",
            SessionKind::Qualifying => "Qualifying",
            SessionKind::Sprint => "Sprint",
            SessionKind::SprintQualifying => "Sprint Qualifying",
        }
    }

    /// Stable segment used inside sync keys. Never rename these: existing
    /// calendar events are recognized by the keys built from them.
    pub fn key_segment(&self) -> &'static str {
        match self {
            SessionKind::Race => "race",
            SessionKind::Qualifying => "qualifying",
            SessionKind::Sprint => "sprint",
            SessionKind::SprintQualifying => "sprint-qualifying",
        }
    }

    pub fn from_key_segment(segment: &str) -> Option<SessionKind> {
        match segment {
            "race" => Some(SessionKind::Race),
            "qualifying" => Some(SessionKind::Qualifying),
            "sprint" => Some(SessionKind::Sprint),
            "sprint-qualifying" => Some(SessionKind::SprintQualifying),
            _ => None,
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_segment())
    }
}

/// Stable identity of one race weekend: season year plus round number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekendId {
    pub season: u16,
    pub round: u32,
}

impl WeekendId {
    /// Inverse of `Display` ("2026-r08").
    pub fn parse(raw: &str) -> Option<WeekendId> {
        let (season, round) = raw.split_once("-r")?;
        Some(WeekendId {
            season: season.parse().ok()?,
            round: round.parse().ok()?,
        })
    }
}

impl fmt::Display for WeekendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-r{:02}", self.season, self.round)
    }
}

/// One orderable unit of track activity, normalized from the raw schedule.
///
/// `(weekend, kind)` uniquely identifies a session within one sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub weekend: WeekendId,
    pub kind: SessionKind,
    /// Human-readable weekend label, e.g. "Monaco Grand Prix".
    pub name: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    /// Free-text venue, may be empty.
    pub location: String,
}

/// Parse the API's split date/time pair into an instant.
///
/// The time component usually carries a trailing `Z`; a bare offset-less
/// time is treated as UTC.
pub fn parse_session_time(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let mut candidate = format!("{}T{}", date.trim(), time.trim());
    if !candidate.ends_with('Z') && !candidate.contains('+') {
        candidate.push('Z');
    }
    DateTime::parse_from_rfc3339(&candidate)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Turn one raw weekend record into its synced sessions.
pub fn extract_sessions(
    record: &RawWeekend,
    durations: &DurationsConfig,
) -> Result<Vec<Session>, MalformedRecordError> {
    let round = record.round.ok_or(MalformedRecordError::MissingRound)?;
    let season = record
        .season
        .ok_or(MalformedRecordError::MissingSeason { round })?;
    let weekend = WeekendId { season, round };
    let name = record.display_name();
    let location = record.location();

    let mut sessions = Vec::new();
    for kind in SessionKind::ALL {
        let Some(stamp) = record.schedule.slot(kind) else {
            continue;
        };
        let (Some(date), Some(time)) = (stamp.date.as_deref(), stamp.time.as_deref()) else {
            continue;
        };
        let Some(start_utc) = parse_session_time(date, time) else {
            warn!(%weekend, %kind, date, time, "unparseable session timestamp, skipping");
            continue;
        };
        let end_utc = start_utc + Duration::minutes(i64::from(durations.minutes_for(kind)));
        sessions.push(Session {
            weekend,
            kind,
            name: name.clone(),
            start_utc,
            end_utc,
            location: location.clone(),
        });
    }
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{RawCircuit, RawSchedule, RawTimestamp};

    fn stamp(date: &str, time: &str) -> Option<RawTimestamp> {
        Some(RawTimestamp {
            date: Some(date.into()),
            time: Some(time.into()),
        })
    }

    fn full_weekend() -> RawWeekend {
        RawWeekend {
            round: Some(8),
            season: Some(2026),
            race_name: Some("Monaco Grand Prix 2026".into()),
            circuit: Some(RawCircuit {
                circuit_name: Some("Circuit de Monaco".into()),
                city: Some("Monte Carlo".into()),
                country: Some("Monaco".into()),
            }),
            schedule: RawSchedule {
                race: stamp("2026-06-07", "13:00:00Z"),
                qualy: stamp("2026-06-06", "14:00:00Z"),
                sprint_race: None,
                sprint_qualy: None,
            },
        }
    }

    #[test]
    fn extracts_one_session_per_non_null_timestamp() {
        let sessions = extract_sessions(&full_weekend(), &DurationsConfig::default()).unwrap();
        assert_eq!(sessions.len(), 2);

        let race = sessions.iter().find(|s| s.kind == SessionKind::Race).unwrap();
        assert_eq!(race.name, "Monaco Grand Prix");
        assert_eq!(race.location, "Monte Carlo, Monaco");
        assert_eq!(race.weekend.to_string(), "2026-r08");
        assert_eq!(race.start_utc.to_rfc3339(), "2026-06-07T13:00:00+00:00");
        // Race end derives from the configured race duration.
        assert_eq!((race.end_utc - race.start_utc).num_minutes(), 120);

        let qualy = sessions
            .iter()
            .find(|s| s.kind == SessionKind::Qualifying)
            .unwrap();
        assert_eq!((qualy.end_utc - qualy.start_utc).num_minutes(), 60);
    }

    #[test]
    fn sprint_weekend_extracts_all_four_kinds() {
        let mut weekend = full_weekend();
        weekend.schedule.sprint_race = stamp("2026-06-06", "10:00:00Z");
        weekend.schedule.sprint_qualy = stamp("2026-06-05", "15:30:00Z");
        let sessions = extract_sessions(&weekend, &DurationsConfig::default()).unwrap();
        assert_eq!(sessions.len(), 4);
    }

    #[test]
    fn empty_timetable_yields_no_sessions() {
        let mut weekend = full_weekend();
        weekend.schedule = RawSchedule::default();
        let sessions = extract_sessions(&weekend, &DurationsConfig::default()).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn null_time_component_is_skipped_silently() {
        let mut weekend = full_weekend();
        weekend.schedule.race = Some(RawTimestamp {
            date: Some("2026-06-07".into()),
            time: None,
        });
        let sessions = extract_sessions(&weekend, &DurationsConfig::default()).unwrap();
        assert_eq!(sessions.len(), 1); // qualifying only
        assert_eq!(sessions[0].kind, SessionKind::Qualifying);
    }

    #[test]
    fn bad_timestamp_skips_only_that_session() {
        let mut weekend = full_weekend();
        weekend.schedule.race = stamp("not-a-date", "13:00:00Z");
        let sessions = extract_sessions(&weekend, &DurationsConfig::default()).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].kind, SessionKind::Qualifying);
    }

    #[test]
    fn missing_round_is_malformed() {
        let mut weekend = full_weekend();
        weekend.round = None;
        let err = extract_sessions(&weekend, &DurationsConfig::default()).unwrap_err();
        assert!(matches!(err, MalformedRecordError::MissingRound));
    }

    #[test]
    fn missing_season_is_malformed() {
        let mut weekend = full_weekend();
        weekend.season = None;
        let err = extract_sessions(&weekend, &DurationsConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            MalformedRecordError::MissingSeason { round: 8 }
        ));
    }

    #[test]
    fn parse_session_time_accepts_bare_utc_time() {
        let parsed = parse_session_time("2026-03-08", "04:00:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-08T04:00:00+00:00");
    }

    #[test]
    fn weekend_id_display_parse_round_trip() {
        let id = WeekendId {
            season: 2026,
            round: 3,
        };
        assert_eq!(id.to_string(), "2026-r03");
        assert_eq!(WeekendId::parse("2026-r03"), Some(id));
        assert_eq!(WeekendId::parse("2026-r23"), Some(WeekendId { season: 2026, round: 23 }));
        assert_eq!(WeekendId::parse("garbage"), None);
        assert_eq!(WeekendId::parse("2026-r"), None);
    }

    #[test]
    fn kind_segments_round_trip() {
        for kind in SessionKind::ALL {
            assert_eq!(SessionKind::from_key_segment(kind.key_segment()), Some(kind));
        }
        assert_eq!(SessionKind::from_key_segment("practice"), None);
    }
}
