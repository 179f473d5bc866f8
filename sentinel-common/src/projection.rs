//! Replay projection: fold a submission's event history into current state
//!
//! The log is the single source of truth. [`project`] is a pure function: the
//! same events always yield the same [`SubmissionState`], regardless of the
//! order they are passed in.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::events::{Event, EventType};
use crate::{Error, Result};

/// Derived, never persisted, state of one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionState {
    /// Type of the temporally-last event; the submission's current status
    pub latest_event_type: EventType,
    pub validated: bool,
    pub approved: bool,
    pub rejected: bool,
    pub conflicted: bool,
    pub exported: bool,
    pub escalated: bool,
    pub needs_more_evidence: bool,
    pub duplicate_of: Vec<Uuid>,
    pub conflict_with: Vec<Uuid>,
}

impl SubmissionState {
    fn initial(latest_event_type: EventType) -> Self {
        Self {
            latest_event_type,
            validated: false,
            approved: false,
            rejected: false,
            conflicted: false,
            exported: false,
            escalated: false,
            needs_more_evidence: false,
            duplicate_of: Vec::new(),
            conflict_with: Vec::new(),
        }
    }

    /// Apply one event's flag updates
    fn apply(&mut self, event: &Event) {
        match event.event_type() {
            EventType::Validated => {
                self.validated = passed_flag(event);
                self.duplicate_of = id_list(event, "duplicate_of").unwrap_or_default();
                self.conflict_with = id_list(event, "conflict_with").unwrap_or_default();
            }
            EventType::Conflicted => {
                self.conflicted = true;
                if let Some(conflict_with) = id_list(event, "conflict_with") {
                    self.conflict_with = conflict_with;
                }
            }
            EventType::Approved => {
                self.approved = true;
                self.rejected = false;
            }
            EventType::Rejected => {
                self.rejected = true;
                self.approved = false;
            }
            EventType::Exported => self.exported = true,
            EventType::Escalated => self.escalated = true,
            EventType::RequestMoreEvidence => self.needs_more_evidence = true,
            _ => {}
        }
    }

    /// True when the submission was reported as a duplicate or conflict
    pub fn needs_attention(&self) -> bool {
        !self.duplicate_of.is_empty() || !self.conflict_with.is_empty()
    }
}

/// Fold events into current state
///
/// Events are re-sorted by `created_at` before folding (stable, so events with
/// equal timestamps keep their input order).
///
/// # Errors
/// [`Error::EmptyEventStream`] if `events` is empty.
pub fn project(events: &[Event]) -> Result<SubmissionState> {
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|event| event.created_at());

    let latest = ordered.last().ok_or(Error::EmptyEventStream)?;
    let mut state = SubmissionState::initial(latest.event_type().clone());
    for event in ordered {
        state.apply(event);
    }
    Ok(state)
}

/// `passed` of a VALIDATED payload; only an absent field counts as passing
fn passed_flag(event: &Event) -> bool {
    match event.payload().get("passed") {
        None => true,
        Some(Value::Bool(passed)) => *passed,
        Some(other) => {
            warn!(
                event_id = %event.event_id(),
                value = %other,
                "Non-boolean passed flag read as failed"
            );
            false
        }
    }
}

/// Read one id list field, field by field so a bad entry never masks the rest
///
/// `None` when the field is absent or not a list. Entries that are not UUIDs
/// are dropped.
fn id_list(event: &Event, field: &str) -> Option<Vec<Uuid>> {
    let entries = event.payload().get(field)?.as_array()?;
    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.as_str().and_then(|raw| Uuid::parse_str(raw).ok()) {
            Some(id) => ids.push(id),
            None => warn!(
                event_id = %event.event_id(),
                event_type = %event.event_type(),
                field,
                value = %entry,
                "Malformed id ignored during replay"
            ),
        }
    }
    Some(ids)
}
