//! One end-to-end sync pass.
//!
//! Pull schedule, extract sessions, map to desired events, fetch the
//! managed events already in the calendar, reconcile, apply. Fatal errors
//! (no schedule, no existing-event set) abort before any event mutation;
//! per-action write failures only land in the summary.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::SyncError;
use crate::schedule::extract_sessions;
use crate::sync::mapper::map_session;
use crate::sync::reconciler;
use crate::sync::traits::{CalendarRef, CalendarStore, ScheduleSource};
use crate::sync::types::{CalendarEvent, SyncAction, SyncSummary};

/// Everything decided before the first store mutation.
#[derive(Debug)]
pub struct PlannedRun {
    pub calendar: CalendarRef,
    pub actions: Vec<SyncAction>,
    pub malformed_records: usize,
    pub past_skipped: usize,
    pub deadline: Option<Instant>,
}

/// Orchestrates one schedule-to-calendar pass.
pub struct SyncRun<'a> {
    source: &'a dyn ScheduleSource,
    store: &'a dyn CalendarStore,
    config: &'a Config,
}

impl<'a> SyncRun<'a> {
    pub fn new(
        source: &'a dyn ScheduleSource,
        store: &'a dyn CalendarStore,
        config: &'a Config,
    ) -> SyncRun<'a> {
        SyncRun {
            source,
            store,
            config,
        }
    }

    /// Fetch, extract, and diff without mutating anything. Used directly
    /// for dry runs.
    pub fn preview(&self) -> Result<PlannedRun, SyncError> {
        let started = Instant::now();
        let deadline = match self.config.run.timeout_secs {
            0 => None,
            secs => Some(started + Duration::from_secs(secs)),
        };

        let schedule = self.source.fetch_current_season()?;
        info!(
            races = schedule.races.len(),
            season = ?schedule.season,
            "fetched season schedule"
        );

        let mut malformed_records = 0;
        let mut sessions = Vec::new();
        for record in &schedule.races {
            match extract_sessions(record, &self.config.durations) {
                Ok(extracted) => sessions.extend(extracted),
                Err(error) => {
                    warn!(%error, "skipping malformed schedule record");
                    malformed_records += 1;
                }
            }
        }

        let mut past_skipped = 0;
        if !self.config.run.include_past {
            let now = Utc::now();
            let before = sessions.len();
            sessions.retain(|s| s.start_utc >= now);
            past_skipped = before - sessions.len();
        }

        let mut desired: Vec<CalendarEvent> = Vec::with_capacity(sessions.len());
        let mut seen = HashSet::new();
        for session in &sessions {
            let event = map_session(session);
            if !seen.insert(event.sync_key.clone()) {
                warn!(key = %event.sync_key, "duplicate session in schedule, keeping first");
                continue;
            }
            desired.push(event);
        }

        let calendar = self.store.ensure_calendar(
            &self.config.calendar.name,
            self.config.calendar.owner_email.as_deref(),
        )?;
        let existing = self.store.list_managed_events(&calendar)?;
        info!(
            desired = desired.len(),
            existing = existing.len(),
            calendar = %calendar,
            "reconciling"
        );

        let actions = reconciler::plan(&desired, &existing);
        Ok(PlannedRun {
            calendar,
            actions,
            malformed_records,
            past_skipped,
            deadline,
        })
    }

    /// Run the full pass and apply every planned action.
    pub fn execute(&self) -> Result<SyncSummary, SyncError> {
        let planned = self.preview()?;
        let mut summary = reconciler::apply(
            &planned.actions,
            self.store,
            &planned.calendar,
            planned.deadline,
        );
        summary.malformed_records = planned.malformed_records;
        summary.past_skipped = planned.past_skipped;
        info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            "sync pass finished"
        );
        Ok(summary)
    }
}
