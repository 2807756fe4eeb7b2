//! # Gridsync Core Library
//!
//! Core logic for syncing the Formula 1 session calendar into an external
//! calendar store. The engine is deliberately split from its I/O glue: the
//! reconciler only ever talks to a [`ScheduleSource`] and a
//! [`CalendarStore`], so every piece of sync semantics is testable against
//! in-memory fakes.
//!
//! ## Architecture
//!
//! - **Extraction**: one raw race-weekend record becomes 0-4 normalized
//!   [`Session`]s (race, qualifying, sprint, sprint qualifying)
//! - **Mapping**: a pure function turns each session into the calendar
//!   event it should correspond to, keyed by a deterministic [`SyncKey`]
//! - **Reconciliation**: desired events are diffed against the events this
//!   system already owns, producing create/update/skip actions that are
//!   applied best-effort
//! - **Glue**: `integrations` holds the f1api.dev HTTP client and the
//!   Google Calendar REST store (OAuth2, tokens in the OS keyring)
//!
//! Events are never deleted: sessions that vanish from the upstream
//! schedule leave their calendar events untouched.

pub mod config;
pub mod error;
pub mod integrations;
pub mod schedule;
pub mod sync;

pub use config::Config;
pub use error::{
    MalformedRecordError, SourceUnavailableError, StoreReadError, StoreWriteError, SyncError,
};
pub use schedule::{RawWeekend, SeasonSchedule, Session, SessionKind, WeekendId};
pub use sync::{
    CalendarEvent, CalendarRef, CalendarStore, ScheduleSource, SyncAction, SyncKey, SyncRun,
    SyncSummary,
};
