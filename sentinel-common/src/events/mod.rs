//! Submission lifecycle events
//!
//! An [`Event`] is one immutable fact about a submission. The persisted
//! `event_type` strings are stable and must match exactly; types this build
//! does not know about are carried as [`EventType::Other`] so replay of older or
//! foreign logs still works.

mod payloads;

pub use payloads::{
    ActionPayload, ConflictedPayload, ExportedPayload, IngestedPayload, ValidatedPayload,
};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// Actor recorded for events the system emits on its own
pub const SYSTEM_ACTOR: &str = "system";

/// Event type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Ingested,
    Validated,
    Conflicted,
    Enriched,
    Approved,
    Rejected,
    Escalated,
    RequestMoreEvidence,
    Exported,
    AiAudited,
    /// Unrecognized tag, preserved verbatim
    Other(String),
}

impl EventType {
    /// Every known event type, in lifecycle order
    pub const ALL: [EventType; 10] = [
        EventType::Ingested,
        EventType::Validated,
        EventType::Conflicted,
        EventType::Enriched,
        EventType::Approved,
        EventType::Rejected,
        EventType::Escalated,
        EventType::RequestMoreEvidence,
        EventType::Exported,
        EventType::AiAudited,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            EventType::Ingested => "INGESTED",
            EventType::Validated => "VALIDATED",
            EventType::Conflicted => "CONFLICTED",
            EventType::Enriched => "ENRICHED",
            EventType::Approved => "APPROVED",
            EventType::Rejected => "REJECTED",
            EventType::Escalated => "ESCALATED",
            EventType::RequestMoreEvidence => "REQUEST_MORE_EVIDENCE",
            EventType::Exported => "EXPORTED",
            EventType::AiAudited => "AI_AUDITED",
            EventType::Other(raw) => raw,
        }
    }

    /// Parse a persisted tag; unknown tags become [`EventType::Other`]
    pub fn parse(raw: &str) -> Self {
        Self::ALL
            .iter()
            .find(|known| known.as_str() == raw)
            .cloned()
            .unwrap_or_else(|| EventType::Other(raw.to_string()))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EventType::Other(_))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EventType {
    fn from(raw: String) -> Self {
        match EventType::parse(&raw) {
            EventType::Other(_) => EventType::Other(raw),
            known => known,
        }
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Manager decision on a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerAction {
    Approve,
    Reject,
    Escalate,
    RequestMoreEvidence,
}

impl ManagerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagerAction::Approve => "approve",
            ManagerAction::Reject => "reject",
            ManagerAction::Escalate => "escalate",
            ManagerAction::RequestMoreEvidence => "request_more_evidence",
        }
    }

    /// Event type recorded for this action
    pub fn event_type(&self) -> EventType {
        match self {
            ManagerAction::Approve => EventType::Approved,
            ManagerAction::Reject => EventType::Rejected,
            ManagerAction::Escalate => EventType::Escalated,
            ManagerAction::RequestMoreEvidence => EventType::RequestMoreEvidence,
        }
    }
}

impl FromStr for ManagerAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approve" => Ok(ManagerAction::Approve),
            "reject" => Ok(ManagerAction::Reject),
            "escalate" => Ok(ManagerAction::Escalate),
            "request_more_evidence" => Ok(ManagerAction::RequestMoreEvidence),
            other => Err(Error::InvalidInput(format!("Unknown manager action: {}", other))),
        }
    }
}

/// One immutable lifecycle fact
///
/// Fields are private and there are no setters: once built, an event can only
/// be read. Stored events are produced exclusively by the event log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    event_id: Uuid,
    submission_id: Uuid,
    event_type: EventType,
    payload: Value,
    actor: String,
    created_at: DateTime<Utc>,
}

impl Event {
    /// Build a detached event (replay input, tests); not persisted
    pub fn new(
        submission_id: Uuid,
        event_type: EventType,
        payload: Value,
        actor: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            submission_id,
            event_type,
            payload,
            actor: actor.into(),
            created_at,
        }
    }

    pub(crate) fn from_parts(
        event_id: Uuid,
        submission_id: Uuid,
        event_type: EventType,
        payload: Value,
        actor: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self { event_id, submission_id, event_type, payload, actor, created_at }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Decode the payload into its typed form
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_strings_are_stable() {
        let tags: Vec<&str> = EventType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(
            tags,
            vec![
                "INGESTED",
                "VALIDATED",
                "CONFLICTED",
                "ENRICHED",
                "APPROVED",
                "REJECTED",
                "ESCALATED",
                "REQUEST_MORE_EVIDENCE",
                "EXPORTED",
                "AI_AUDITED",
            ]
        );
    }

    #[test]
    fn test_parse_round_trips_known_tags() {
        for known in EventType::ALL.iter() {
            assert_eq!(&EventType::parse(known.as_str()), known);
        }
    }

    #[test]
    fn test_unknown_tag_preserved() {
        let parsed = EventType::parse("EVIDENCE_ANALYZED");
        assert_eq!(parsed, EventType::Other("EVIDENCE_ANALYZED".to_string()));
        assert!(!parsed.is_known());
        assert_eq!(parsed.to_string(), "EVIDENCE_ANALYZED");
    }

    #[test]
    fn test_event_type_serializes_as_plain_string() {
        assert_eq!(serde_json::to_value(EventType::RequestMoreEvidence).unwrap(), json!("REQUEST_MORE_EVIDENCE"));
        let back: EventType = serde_json::from_value(json!("APPROVED")).unwrap();
        assert_eq!(back, EventType::Approved);
    }

    #[test]
    fn test_manager_action_mapping() {
        assert_eq!(ManagerAction::Approve.event_type(), EventType::Approved);
        assert_eq!(ManagerAction::Reject.event_type(), EventType::Rejected);
        assert_eq!(ManagerAction::Escalate.event_type(), EventType::Escalated);
        assert_eq!(
            ManagerAction::RequestMoreEvidence.event_type(),
            EventType::RequestMoreEvidence
        );
    }

    #[test]
    fn test_manager_action_from_str() {
        assert_eq!("request_more_evidence".parse::<ManagerAction>().unwrap(), ManagerAction::RequestMoreEvidence);
        assert!(matches!("delete".parse::<ManagerAction>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_payload_as_typed() {
        let event = Event::new(
            Uuid::new_v4(),
            EventType::Ingested,
            json!({"submission_hash": "abc"}),
            "ct_01",
            Utc::now(),
        );
        let payload: IngestedPayload = event.payload_as().unwrap();
        assert_eq!(payload.submission_hash, "abc");
    }
}
