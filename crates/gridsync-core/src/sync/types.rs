//! Core types for calendar reconciliation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StoreWriteError;
use crate::schedule::{SessionKind, WeekendId};

/// Deterministic identifier tying a session to its calendar event across
/// runs. Canonical form: `f1/{season}-r{round:02}/{kind}`.
///
/// Events whose embedded key does not parse back through [`SyncKey::parse`]
/// were not created by this system and are never touched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncKey(String);

impl SyncKey {
    pub fn new(weekend: &WeekendId, kind: SessionKind) -> SyncKey {
        SyncKey(format!("f1/{}/{}", weekend, kind.key_segment()))
    }

    /// Recognize a key this system produced. Anything else is unmanaged.
    pub fn parse(raw: &str) -> Option<SyncKey> {
        let mut parts = raw.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("f1"), Some(weekend), Some(kind))
                if WeekendId::parse(weekend).is_some()
                    && SessionKind::from_key_segment(kind).is_some() =>
            {
                Some(SyncKey(raw.to_string()))
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest over the display fields that decide whether an update is needed.
pub fn content_hash(
    title: &str,
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
    location: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update([0]);
    hasher.update(start_utc.to_rfc3339().as_bytes());
    hasher.update([0]);
    hasher.update(end_utc.to_rfc3339().as_bytes());
    hasher.update([0]);
    hasher.update(location.as_bytes());
    hex::encode(hasher.finalize())
}

/// The external calendar representation of one session.
///
/// `external_id` is assigned by the store on creation and absent on freshly
/// mapped events. `content_hash` is the digest recorded at last write; for
/// desired events it is computed by the mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub external_id: Option<String>,
    pub sync_key: SyncKey,
    pub title: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub location: String,
    pub content_hash: String,
}

impl CalendarEvent {
    /// Recompute the digest from the event's current display fields.
    pub fn compute_hash(&self) -> String {
        content_hash(&self.title, self.start_utc, self.end_utc, &self.location)
    }
}

/// One reconciliation decision. There is deliberately no delete variant:
/// events whose schedule entry disappears upstream are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    Create(CalendarEvent),
    Update {
        external_id: String,
        event: CalendarEvent,
    },
    Skip {
        sync_key: SyncKey,
    },
}

impl SyncAction {
    pub fn sync_key(&self) -> &SyncKey {
        match self {
            SyncAction::Create(event) => &event.sync_key,
            SyncAction::Update { event, .. } => &event.sync_key,
            SyncAction::Skip { sync_key } => sync_key,
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Create(event) => write!(f, "create {} ({})", event.sync_key, event.title),
            SyncAction::Update { external_id, event } => {
                write!(f, "update {} ({})", event.sync_key, external_id)
            }
            SyncAction::Skip { sync_key } => write!(f, "skip   {sync_key}"),
        }
    }
}

/// A store write that was rejected, recorded against its sync key.
#[derive(Debug)]
pub struct ActionFailure {
    pub sync_key: SyncKey,
    pub error: StoreWriteError,
}

/// Aggregated outcome of one sync run.
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: Vec<ActionFailure>,
    /// Schedule records skipped because they could not be keyed.
    pub malformed_records: usize,
    /// Sessions dropped because their start time had already passed.
    pub past_skipped: usize,
    /// Actions not started because the run's wall-clock budget ran out.
    pub timed_out: usize,
}

impl SyncSummary {
    /// True when every planned store mutation was applied.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.timed_out == 0
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sync summary:")?;
        writeln!(f, "  created:   {}", self.created)?;
        writeln!(f, "  updated:   {}", self.updated)?;
        writeln!(f, "  skipped:   {}", self.skipped)?;
        writeln!(f, "  failed:    {}", self.failed.len())?;
        for failure in &self.failed {
            writeln!(f, "    - {}: {}", failure.sync_key, failure.error)?;
        }
        if self.malformed_records > 0 {
            writeln!(f, "  malformed records: {}", self.malformed_records)?;
        }
        if self.past_skipped > 0 {
            writeln!(f, "  past sessions:     {}", self.past_skipped)?;
        }
        if self.timed_out > 0 {
            writeln!(f, "  timed out:         {}", self.timed_out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn weekend() -> WeekendId {
        WeekendId {
            season: 2026,
            round: 8,
        }
    }

    #[test]
    fn sync_key_canonical_form() {
        let key = SyncKey::new(&weekend(), SessionKind::SprintQualifying);
        assert_eq!(key.as_str(), "f1/2026-r08/sprint-qualifying");
    }

    #[test]
    fn sync_key_parse_accepts_own_output() {
        for kind in SessionKind::ALL {
            let key = SyncKey::new(&weekend(), kind);
            assert_eq!(SyncKey::parse(key.as_str()), Some(key));
        }
    }

    #[test]
    fn sync_key_parse_rejects_foreign_strings() {
        for raw in [
            "",
            "f1",
            "f1/2026-r08",
            "f1/2026-r08/practice",
            "f1/not-a-weekend/race",
            "f2/2026-r08/race",
            "some-other-apps-id-1234",
        ] {
            assert_eq!(SyncKey::parse(raw), None, "accepted {raw:?}");
        }
    }

    #[test]
    fn content_hash_is_stable_and_field_sensitive() {
        let start = Utc.with_ymd_and_hms(2026, 6, 7, 13, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 6, 7, 15, 0, 0).unwrap();
        let a = content_hash("Race: Monaco Grand Prix", start, end, "Monte Carlo, Monaco");
        let b = content_hash("Race: Monaco Grand Prix", start, end, "Monte Carlo, Monaco");
        assert_eq!(a, b);

        let moved = content_hash(
            "Race: Monaco Grand Prix",
            start + chrono::Duration::hours(1),
            end,
            "Monte Carlo, Monaco",
        );
        assert_ne!(a, moved);

        let renamed = content_hash("Race: Monegasque GP", start, end, "Monte Carlo, Monaco");
        assert_ne!(a, renamed);
    }

    #[test]
    fn summary_display_lists_failures() {
        let summary = SyncSummary {
            created: 2,
            failed: vec![ActionFailure {
                sync_key: SyncKey::new(&weekend(), SessionKind::Race),
                error: StoreWriteError::RateLimited,
            }],
            ..Default::default()
        };
        let rendered = summary.to_string();
        assert!(rendered.contains("created:   2"));
        assert!(rendered.contains("f1/2026-r08/race"));
        assert!(!summary.is_clean());
    }
}
