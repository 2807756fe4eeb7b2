//! The reconciliation core: diff desired events against the events this
//! system already owns, then apply the resulting actions best-effort.
//!
//! Planning is pure. Application is a sequential batch: one rejected write
//! is recorded against its sync key and never blocks the remaining
//! actions, and once the run's wall-clock deadline passes no new store
//! call is started.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, warn};

use crate::sync::traits::{CalendarRef, CalendarStore};
use crate::sync::types::{ActionFailure, CalendarEvent, SyncAction, SyncSummary};

/// Compute the minimal action list turning `existing` into `desired`.
///
/// - desired key absent from existing: create
/// - key present, content hash equal: skip (no store call)
/// - key present, content hash differs: update in place
/// - existing key absent from desired: untouched (no delete exists)
pub fn plan(desired: &[CalendarEvent], existing: &[CalendarEvent]) -> Vec<SyncAction> {
    let mut existing_by_key: HashMap<&str, &CalendarEvent> = HashMap::new();
    for event in existing {
        if existing_by_key.contains_key(event.sync_key.as_str()) {
            // Duplicate managed keys mean an earlier run double-created;
            // reconcile against the first and leave the rest alone.
            warn!(key = %event.sync_key, "duplicate managed event, keeping first");
            continue;
        }
        existing_by_key.insert(event.sync_key.as_str(), event);
    }

    let mut actions = Vec::with_capacity(desired.len());
    for wanted in desired {
        match existing_by_key.get(wanted.sync_key.as_str()) {
            None => actions.push(SyncAction::Create(wanted.clone())),
            Some(current) => {
                if current.content_hash == wanted.content_hash {
                    actions.push(SyncAction::Skip {
                        sync_key: wanted.sync_key.clone(),
                    });
                } else {
                    match &current.external_id {
                        Some(external_id) => actions.push(SyncAction::Update {
                            external_id: external_id.clone(),
                            event: wanted.clone(),
                        }),
                        None => {
                            // A store returned a managed event without its
                            // own id; nothing can be safely addressed.
                            warn!(key = %wanted.sync_key, "existing event has no external id, leaving untouched");
                        }
                    }
                }
            }
        }
    }
    actions
}

/// Apply planned actions through the store, collecting a summary.
///
/// Skips are counted without consulting the deadline -- they cost no store
/// call. Every other action still pending when the deadline passes is
/// counted as timed out and left for the next run.
pub fn apply(
    actions: &[SyncAction],
    store: &dyn CalendarStore,
    calendar: &CalendarRef,
    deadline: Option<Instant>,
) -> SyncSummary {
    let mut summary = SyncSummary::default();
    for action in actions {
        if let SyncAction::Skip { sync_key } = action {
            debug!(key = %sync_key, "unchanged");
            summary.skipped += 1;
            continue;
        }
        if deadline.map_or(false, |d| Instant::now() >= d) {
            summary.timed_out += 1;
            continue;
        }
        match action {
            SyncAction::Create(event) => match store.create_event(calendar, event) {
                Ok(external_id) => {
                    debug!(key = %event.sync_key, %external_id, "created");
                    summary.created += 1;
                }
                Err(error) => {
                    warn!(key = %event.sync_key, %error, "create rejected");
                    summary.failed.push(ActionFailure {
                        sync_key: event.sync_key.clone(),
                        error,
                    });
                }
            },
            SyncAction::Update { external_id, event } => {
                match store.update_event(calendar, external_id, event) {
                    Ok(()) => {
                        debug!(key = %event.sync_key, %external_id, "updated");
                        summary.updated += 1;
                    }
                    Err(error) => {
                        warn!(key = %event.sync_key, %error, "update rejected");
                        summary.failed.push(ActionFailure {
                            sync_key: event.sync_key.clone(),
                            error,
                        });
                    }
                }
            }
            SyncAction::Skip { .. } => unreachable!("skips handled above"),
        }
    }
    summary
}
