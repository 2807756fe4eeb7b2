//! The two collaborator interfaces the engine consumes.
//!
//! Everything behind these traits is I/O glue. The engine never depends on
//! a concrete source or store, which keeps reconciliation semantics
//! testable against in-memory fakes.

use std::fmt;

use crate::error::{SourceUnavailableError, StoreReadError, StoreWriteError};
use crate::schedule::SeasonSchedule;
use crate::sync::types::CalendarEvent;

/// Opaque handle to the target calendar, resolved once per run and passed
/// explicitly through every store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarRef(String);

impl CalendarRef {
    pub fn new(id: impl Into<String>) -> CalendarRef {
        CalendarRef(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CalendarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the current season's raw schedule comes from.
pub trait ScheduleSource {
    fn fetch_current_season(&self) -> Result<SeasonSchedule, SourceUnavailableError>;
}

/// The external calendar this system writes into.
pub trait CalendarStore {
    /// Idempotent get-or-create of the target calendar. Any failure here is
    /// fatal for the run.
    fn ensure_calendar(
        &self,
        name: &str,
        owner_email: Option<&str>,
    ) -> Result<CalendarRef, StoreReadError>;

    /// Every event previously created by this system in the given
    /// calendar. Events without a recognizable sync key are not returned.
    fn list_managed_events(
        &self,
        calendar: &CalendarRef,
    ) -> Result<Vec<CalendarEvent>, StoreReadError>;

    /// Create an event, returning the store-assigned external id.
    fn create_event(
        &self,
        calendar: &CalendarRef,
        event: &CalendarEvent,
    ) -> Result<String, StoreWriteError>;

    /// Replace an existing event in place. A missing target surfaces as
    /// [`StoreWriteError::NotFound`] -- a failed action, not a crash.
    fn update_event(
        &self,
        calendar: &CalendarRef,
        external_id: &str,
        event: &CalendarEvent,
    ) -> Result<(), StoreWriteError>;
}
