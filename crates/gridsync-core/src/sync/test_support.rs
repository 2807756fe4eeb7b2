//! In-memory fakes and fixture helpers shared by the sync tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::error::{SourceUnavailableError, StoreReadError, StoreWriteError};
use crate::schedule::{SeasonSchedule, Session, SessionKind, WeekendId};
use crate::sync::traits::{CalendarRef, CalendarStore, ScheduleSource};
use crate::sync::types::{CalendarEvent, SyncKey};

/// In-memory calendar store. Write failures can be injected per sync key,
/// read failures globally.
pub struct FakeStore {
    events: RefCell<Vec<CalendarEvent>>,
    failing_keys: RefCell<HashSet<SyncKey>>,
    fail_list: Cell<bool>,
    next_id: Cell<u64>,
}

impl FakeStore {
    pub fn new() -> FakeStore {
        FakeStore {
            events: RefCell::new(Vec::new()),
            failing_keys: RefCell::new(HashSet::new()),
            fail_list: Cell::new(false),
            next_id: Cell::new(1),
        }
    }

    pub fn fail_writes_for(&self, key: SyncKey) {
        self.failing_keys.borrow_mut().insert(key);
    }

    pub fn fail_listing(&self) {
        self.fail_list.set(true);
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.events.borrow().clone()
    }
}

impl CalendarStore for FakeStore {
    fn ensure_calendar(
        &self,
        _name: &str,
        _owner_email: Option<&str>,
    ) -> Result<CalendarRef, StoreReadError> {
        Ok(CalendarRef::new("fake-calendar"))
    }

    fn list_managed_events(
        &self,
        _calendar: &CalendarRef,
    ) -> Result<Vec<CalendarEvent>, StoreReadError> {
        if self.fail_list.get() {
            return Err(StoreReadError::Api("listing failed".into()));
        }
        Ok(self.events())
    }

    fn create_event(
        &self,
        _calendar: &CalendarRef,
        event: &CalendarEvent,
    ) -> Result<String, StoreWriteError> {
        if self.failing_keys.borrow().contains(&event.sync_key) {
            return Err(StoreWriteError::Api("create rejected".into()));
        }
        let external_id = format!("ext-{}", self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        let mut stored = event.clone();
        stored.external_id = Some(external_id.clone());
        self.events.borrow_mut().push(stored);
        Ok(external_id)
    }

    fn update_event(
        &self,
        _calendar: &CalendarRef,
        external_id: &str,
        event: &CalendarEvent,
    ) -> Result<(), StoreWriteError> {
        if self.failing_keys.borrow().contains(&event.sync_key) {
            return Err(StoreWriteError::Api("update rejected".into()));
        }
        let mut events = self.events.borrow_mut();
        match events
            .iter_mut()
            .find(|e| e.external_id.as_deref() == Some(external_id))
        {
            Some(stored) => {
                let mut replacement = event.clone();
                replacement.external_id = Some(external_id.to_string());
                *stored = replacement;
                Ok(())
            }
            None => Err(StoreWriteError::NotFound {
                external_id: external_id.to_string(),
            }),
        }
    }
}

/// Canned schedule source.
pub enum FakeSource {
    Schedule(SeasonSchedule),
    Unavailable,
}

impl ScheduleSource for FakeSource {
    fn fetch_current_season(&self) -> Result<SeasonSchedule, SourceUnavailableError> {
        match self {
            FakeSource::Schedule(schedule) => Ok(schedule.clone()),
            FakeSource::Unavailable => Err(SourceUnavailableError::Status { status: 503 }),
        }
    }
}

pub fn fixed_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 7, 13, 0, 0).unwrap()
}

pub fn session_at(round: u32, kind: SessionKind, start: DateTime<Utc>) -> Session {
    Session {
        weekend: WeekendId {
            season: 2026,
            round,
        },
        kind,
        name: format!("Round {round} Grand Prix"),
        start_utc: start,
        end_utc: start + Duration::minutes(120),
        location: "Somewhere".into(),
    }
}
