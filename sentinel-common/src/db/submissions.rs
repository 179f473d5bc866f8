//! Submission queries
//!
//! Insert and read only; there is deliberately no update path.

use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};
use uuid::Uuid;

use super::{parse_uuid, NewSubmission, Submission};
use crate::time::{from_db_timestamp, now, to_db_timestamp};
use crate::{Error, Result};

const SUBMISSION_COLUMNS: &str = "submission_id, case_id, contractor_id, chain, address, scam_type, \
     source_url, confidence_score, created_at, raw_payload_json, submission_hash";

/// Insert a submission row
pub async fn insert_submission<'e, E>(executor: E, new: NewSubmission) -> Result<Submission>
where
    E: Executor<'e, Database = Sqlite>,
{
    let submission = Submission {
        submission_id: Uuid::new_v4(),
        case_id: new.case_id,
        contractor_id: new.contractor_id,
        chain: new.chain,
        address: new.address,
        scam_type: new.scam_type,
        source_url: new.source_url,
        confidence_score: new.confidence_score,
        created_at: now(),
        raw_payload_json: new.raw_payload_json,
        submission_hash: new.submission_hash,
    };

    sqlx::query(&format!(
        "INSERT INTO submissions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        SUBMISSION_COLUMNS
    ))
    .bind(submission.submission_id.to_string())
    .bind(submission.case_id.to_string())
    .bind(submission.contractor_id.to_string())
    .bind(&submission.chain)
    .bind(&submission.address)
    .bind(&submission.scam_type)
    .bind(&submission.source_url)
    .bind(i64::from(submission.confidence_score))
    .bind(to_db_timestamp(&submission.created_at))
    .bind(&submission.raw_payload_json)
    .bind(&submission.submission_hash)
    .execute(executor)
    .await?;

    Ok(submission)
}

/// Load a submission by id
pub async fn get_submission<'e, E>(executor: E, submission_id: Uuid) -> Result<Option<Submission>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(&format!(
        "SELECT {} FROM submissions WHERE submission_id = ?",
        SUBMISSION_COLUMNS
    ))
    .bind(submission_id.to_string())
    .fetch_optional(executor)
    .await?;

    row.map(|row| submission_from_row(&row)).transpose()
}

/// All submissions in a case, in insertion order
pub async fn list_case_submissions<'e, E>(executor: E, case_id: Uuid) -> Result<Vec<Submission>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(&format!(
        "SELECT {} FROM submissions WHERE case_id = ? ORDER BY created_at ASC, rowid ASC",
        SUBMISSION_COLUMNS
    ))
    .bind(case_id.to_string())
    .fetch_all(executor)
    .await?;

    rows.iter().map(submission_from_row).collect()
}

/// All submissions by one contractor, across cases
pub async fn list_contractor_submissions<'e, E>(
    executor: E,
    contractor_id: Uuid,
) -> Result<Vec<Submission>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(&format!(
        "SELECT {} FROM submissions WHERE contractor_id = ? ORDER BY created_at ASC, rowid ASC",
        SUBMISSION_COLUMNS
    ))
    .bind(contractor_id.to_string())
    .fetch_all(executor)
    .await?;

    rows.iter().map(submission_from_row).collect()
}

fn submission_from_row(row: &SqliteRow) -> Result<Submission> {
    let submission_id: String = row.get("submission_id");
    let case_id: String = row.get("case_id");
    let contractor_id: String = row.get("contractor_id");
    let confidence_score: i64 = row.get("confidence_score");
    let created_at: String = row.get("created_at");

    Ok(Submission {
        submission_id: parse_uuid(&submission_id, "submission_id")?,
        case_id: parse_uuid(&case_id, "case_id")?,
        contractor_id: parse_uuid(&contractor_id, "contractor_id")?,
        chain: row.get("chain"),
        address: row.get("address"),
        scam_type: row.get("scam_type"),
        source_url: row.get("source_url"),
        confidence_score: u8::try_from(confidence_score).map_err(|_| {
            Error::Internal(format!("Stored confidence score out of range: {}", confidence_score))
        })?,
        created_at: from_db_timestamp(&created_at)?,
        raw_payload_json: row.get("raw_payload_json"),
        submission_hash: row.get("submission_hash"),
    })
}
