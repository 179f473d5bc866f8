//! Case export: approved submissions, each marked with an EXPORTED event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sentinel_common::db::{
    append_event, begin_write, get_case, list_case_events, list_case_submissions,
};
use sentinel_common::events::{ExportedPayload, SYSTEM_ACTOR};
use sentinel_common::time::now;
use sentinel_common::{project, Error, Event, EventType, KeyedLocks, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Requested export format; recorded on the EXPORTED event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::InvalidInput(format!("Unsupported export format: {}", other))),
        }
    }
}

/// One exported submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    pub case_id: Uuid,
    pub submission_id: Uuid,
    pub contractor_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub chain: String,
    pub address: String,
    pub scam_type: String,
    pub source_url: String,
    pub confidence_score: u8,
    pub submission_hash: String,
    /// Payload of the latest VALIDATED event, `{}` if none
    pub validation_summary: Value,
}

/// Export every submission in the case whose current status is APPROVED
///
/// Selection and EXPORTED appends share one transaction under the case lock.
pub async fn export_case(
    pool: &SqlitePool,
    case_locks: &KeyedLocks,
    case_id: Uuid,
    format: ExportFormat,
) -> Result<Vec<ExportRecord>> {
    let _case_guard = case_locks.lock(case_id).await;
    let mut tx = begin_write(pool).await?;

    if get_case(&mut *tx, case_id).await?.is_none() {
        return Err(Error::NotFound(format!("case {}", case_id)));
    }

    let submissions = list_case_submissions(&mut *tx, case_id).await?;
    let mut events_by_submission: HashMap<Uuid, Vec<Event>> = HashMap::new();
    for event in list_case_events(&mut *tx, case_id).await? {
        events_by_submission.entry(event.submission_id()).or_default().push(event);
    }

    let exported_at = now();
    let mut records = Vec::new();

    for submission in submissions {
        let Some(events) = events_by_submission.get(&submission.submission_id) else {
            continue;
        };
        if project(events)?.latest_event_type != EventType::Approved {
            continue;
        }

        records.push(ExportRecord {
            case_id: submission.case_id,
            submission_id: submission.submission_id,
            contractor_id: submission.contractor_id,
            created_at: submission.created_at,
            chain: submission.chain,
            address: submission.address,
            scam_type: submission.scam_type,
            source_url: submission.source_url,
            confidence_score: submission.confidence_score,
            submission_hash: submission.submission_hash,
            validation_summary: latest_validated_payload(events),
        });

        append_event(
            &mut tx,
            submission.submission_id,
            EventType::Exported,
            serde_json::to_value(ExportedPayload {
                format: format.as_str().to_string(),
                exported_at,
            })?,
            SYSTEM_ACTOR,
            Some(exported_at),
        )
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        case_id = %case_id,
        format = format.as_str(),
        exported = records.len(),
        "Case exported"
    );
    Ok(records)
}

/// Events arrive in log order, so the last VALIDATED wins
fn latest_validated_payload(events: &[Event]) -> Value {
    events
        .iter()
        .rev()
        .find(|event| event.event_type() == &EventType::Validated)
        .map(|event| event.payload().clone())
        .unwrap_or_else(|| Value::Object(Default::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!(matches!("xml".parse::<ExportFormat>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_latest_validated_payload() {
        let id = Uuid::new_v4();
        let at = now();
        let events = vec![
            Event::new(id, EventType::Validated, json!({"passed": false}), SYSTEM_ACTOR, at),
            Event::new(id, EventType::Validated, json!({"passed": true}), SYSTEM_ACTOR, at),
            Event::new(id, EventType::Approved, json!({}), "m", at),
        ];
        assert_eq!(latest_validated_payload(&events), json!({"passed": true}));
        assert_eq!(latest_validated_payload(&events[2..]), json!({}));
    }
}
