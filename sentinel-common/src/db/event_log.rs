//! Append-only submission event log
//!
//! The only write path for `submission_events` is [`append_event`]. Rows are
//! never updated or deleted; the schema rejects both with triggers.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::parse_uuid;
use crate::canonical::canonical_json;
use crate::locks::KeyedLocks;
use crate::projection::{project, SubmissionState};
use crate::time::{from_db_timestamp, now, to_db_timestamp};
use crate::{Error, Event, EventType, Result};

/// Append one event and return it as stored
///
/// Takes a connection so callers can group several appends (and the
/// submission insert) into a single transaction.
pub async fn append_event(
    conn: &mut SqliteConnection,
    submission_id: Uuid,
    event_type: EventType,
    payload: Value,
    actor: &str,
    created_at: Option<DateTime<Utc>>,
) -> Result<Event> {
    let event_id = Uuid::new_v4();
    let created_at = created_at.unwrap_or_else(now);

    sqlx::query(
        r#"
        INSERT INTO submission_events
            (event_id, submission_id, event_type, event_payload_json, created_at, actor)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(event_id.to_string())
    .bind(submission_id.to_string())
    .bind(event_type.as_str())
    .bind(canonical_json(&payload))
    .bind(to_db_timestamp(&created_at))
    .bind(actor)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(
        submission_id = %submission_id,
        event_type = event_type.as_str(),
        actor = actor,
        "Event appended"
    );

    // Read back through the stored representation so the caller sees exactly
    // what replay will see (timestamp precision included)
    let stored_at = from_db_timestamp(&to_db_timestamp(&created_at))?;
    Ok(Event::from_parts(
        event_id,
        submission_id,
        event_type,
        payload,
        actor.to_string(),
        stored_at,
    ))
}

/// All events of a submission in creation order, ties broken by append order
pub async fn list_events<'e, E>(executor: E, submission_id: Uuid) -> Result<Vec<Event>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT event_id, submission_id, event_type, event_payload_json, created_at, actor
        FROM submission_events
        WHERE submission_id = ?
        ORDER BY created_at ASC, seq ASC
        "#,
    )
    .bind(submission_id.to_string())
    .fetch_all(executor)
    .await?;

    rows.iter().map(event_from_row).collect()
}

/// Events of every submission in a case, grouped per submission
pub async fn list_case_events<'e, E>(executor: E, case_id: Uuid) -> Result<Vec<Event>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        SELECT e.event_id, e.submission_id, e.event_type, e.event_payload_json, e.created_at, e.actor
        FROM submission_events e
        JOIN submissions s ON s.submission_id = e.submission_id
        WHERE s.case_id = ?
        ORDER BY e.submission_id ASC, e.created_at ASC, e.seq ASC
        "#,
    )
    .bind(case_id.to_string())
    .fetch_all(executor)
    .await?;

    rows.iter().map(event_from_row).collect()
}

fn event_from_row(row: &SqliteRow) -> Result<Event> {
    let event_id: String = row.get("event_id");
    let submission_id: String = row.get("submission_id");
    let event_type: String = row.get("event_type");
    let payload_json: String = row.get("event_payload_json");
    let created_at: String = row.get("created_at");

    let payload: Value = serde_json::from_str(&payload_json).map_err(|e| {
        Error::Internal(format!("Corrupt payload for event {}: {}", event_id, e))
    })?;

    Ok(Event::from_parts(
        parse_uuid(&event_id, "event_id")?,
        parse_uuid(&submission_id, "submission_id")?,
        EventType::parse(&event_type),
        payload,
        row.get("actor"),
        from_db_timestamp(&created_at)?,
    ))
}

/// Pool-backed event log with per-submission append serialization
#[derive(Debug, Clone)]
pub struct EventLog {
    pool: SqlitePool,
    locks: KeyedLocks,
}

impl EventLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, locks: KeyedLocks::new() }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Append a single event outside any caller transaction
    pub async fn append(
        &self,
        submission_id: Uuid,
        event_type: EventType,
        payload: Value,
        actor: &str,
    ) -> Result<Event> {
        let _guard = self.locks.lock(submission_id).await;
        let mut conn = self.pool.acquire().await?;
        append_event(&mut conn, submission_id, event_type, payload, actor, None).await
    }

    /// Append only if `check` accepts the submission's current state
    ///
    /// Projection, check and append happen under the submission lock, so no
    /// other append through this log can interleave.
    pub async fn append_checked<F>(
        &self,
        submission_id: Uuid,
        event_type: EventType,
        payload: Value,
        actor: &str,
        check: F,
    ) -> Result<Event>
    where
        F: FnOnce(&SubmissionState) -> Result<()>,
    {
        let _guard = self.locks.lock(submission_id).await;
        let mut conn = self.pool.acquire().await?;
        let events = list_events(&mut *conn, submission_id).await?;
        check(&project(&events)?)?;
        append_event(&mut conn, submission_id, event_type, payload, actor, None).await
    }

    pub async fn list_events(&self, submission_id: Uuid) -> Result<Vec<Event>> {
        list_events(&self.pool, submission_id).await
    }

    /// Replay the submission's full history
    pub async fn project(&self, submission_id: Uuid) -> Result<SubmissionState> {
        let events = self.list_events(submission_id).await?;
        project(&events)
    }
}
