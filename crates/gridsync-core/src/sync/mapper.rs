//! Session to calendar-event mapping.
//!
//! Pure and deterministic: the same session always yields the same sync
//! key and content hash, which is what makes repeated runs idempotent.

use crate::schedule::Session;
use crate::sync::types::{content_hash, CalendarEvent, SyncKey};

/// Map one session to the calendar event it should correspond to.
/// `external_id` stays unset; the store assigns it on creation.
pub fn map_session(session: &Session) -> CalendarEvent {
    let title = format!("{}: {}", session.kind.label(), session.name);
    let hash = content_hash(&title, session.start_utc, session.end_utc, &session.location);
    CalendarEvent {
        external_id: None,
        sync_key: SyncKey::new(&session.weekend, session.kind),
        title,
        start_utc: session.start_utc,
        end_utc: session.end_utc,
        location: session.location.clone(),
        content_hash: hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{SessionKind, WeekendId};
    use chrono::{Duration, TimeZone, Utc};

    fn session(kind: SessionKind) -> Session {
        let start = Utc.with_ymd_and_hms(2026, 6, 7, 13, 0, 0).unwrap();
        Session {
            weekend: WeekendId {
                season: 2026,
                round: 8,
            },
            kind,
            name: "Monaco Grand Prix".into(),
            start_utc: start,
            end_utc: start + Duration::minutes(120),
            location: "Monte Carlo, Monaco".into(),
        }
    }

    #[test]
    fn title_is_kind_label_then_name() {
        assert_eq!(
            map_session(&session(SessionKind::Race)).title,
            "Race: Monaco Grand Prix"
        );
        assert_eq!(
            map_session(&session(SessionKind::Qualifying)).title,
            "Qualifying: Monaco Grand Prix"
        );
        assert_eq!(
            map_session(&session(SessionKind::Sprint)).title,
            "Sprint: Monaco Grand Prix"
        );
        assert_eq!(
            map_session(&session(SessionKind::SprintQualifying)).title,
            "Sprint Qualifying: Monaco Grand Prix"
        );
    }

    #[test]
    fn mapping_is_deterministic() {
        let a = map_session(&session(SessionKind::Race));
        let b = map_session(&session(SessionKind::Race));
        assert_eq!(a.sync_key, b.sync_key);
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a, b);
    }

    #[test]
    fn external_id_is_unset() {
        assert!(map_session(&session(SessionKind::Race)).external_id.is_none());
    }

    #[test]
    fn recorded_hash_matches_recomputed_hash() {
        let event = map_session(&session(SessionKind::Race));
        assert_eq!(event.content_hash, event.compute_hash());
    }

    #[test]
    fn same_weekend_different_kinds_get_distinct_keys() {
        let race = map_session(&session(SessionKind::Race));
        let qualy = map_session(&session(SessionKind::Qualifying));
        assert_ne!(race.sync_key, qualy.sync_key);
    }
}
