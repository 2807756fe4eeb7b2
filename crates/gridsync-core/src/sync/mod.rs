//! Calendar reconciliation layer.
//!
//! Maps extracted sessions to their calendar events, diffs them against
//! the events this system already owns, and applies the resulting actions
//! through an abstract [`CalendarStore`].

pub mod engine;
pub mod mapper;
pub mod reconciler;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_support;


pub use engine::{PlannedRun, SyncRun};
pub use mapper::map_session;
pub use reconciler::{apply, plan};
pub use traits::{CalendarRef, CalendarStore, ScheduleSource};
pub use types::{content_hash, ActionFailure, CalendarEvent, SyncAction, SyncKey, SyncSummary};
