//! Case queries

use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};
use uuid::Uuid;

use super::{parse_uuid, Case, CaseStatus, NewCase};
use crate::time::{derive_case_times, from_db_timestamp, to_db_timestamp};
use crate::{Error, Result};

const MAX_TITLE_LEN: usize = 255;

/// Create an OPEN case, deriving default start and deadline times
pub async fn create_case<'e, E>(executor: E, new_case: NewCase) -> Result<Case>
where
    E: Executor<'e, Database = Sqlite>,
{
    let title = new_case.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::InvalidInput(format!(
            "Case title must be 1-{} characters",
            MAX_TITLE_LEN
        )));
    }

    let (start_time, deadline_time) =
        derive_case_times(new_case.start_time, new_case.deadline_time);
    let case = Case {
        case_id: Uuid::new_v4(),
        title: title.to_string(),
        priority: new_case.priority,
        start_time,
        deadline_time,
        status: CaseStatus::Open,
    };

    sqlx::query(
        r#"
        INSERT INTO cases (case_id, title, priority, start_time, deadline_time, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(case.case_id.to_string())
    .bind(&case.title)
    .bind(case.priority.as_str())
    .bind(to_db_timestamp(&case.start_time))
    .bind(to_db_timestamp(&case.deadline_time))
    .bind(case.status.as_str())
    .execute(executor)
    .await?;

    tracing::info!(case_id = %case.case_id, priority = case.priority.as_str(), "Case created");
    Ok(case)
}

/// Load a case by id
pub async fn get_case<'e, E>(executor: E, case_id: Uuid) -> Result<Option<Case>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        "SELECT case_id, title, priority, start_time, deadline_time, status FROM cases WHERE case_id = ?",
    )
    .bind(case_id.to_string())
    .fetch_optional(executor)
    .await?;

    row.map(|row| case_from_row(&row)).transpose()
}

/// All cases, newest start time first
pub async fn list_cases<'e, E>(executor: E) -> Result<Vec<Case>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "SELECT case_id, title, priority, start_time, deadline_time, status FROM cases ORDER BY start_time DESC",
    )
    .fetch_all(executor)
    .await?;

    rows.iter().map(case_from_row).collect()
}

fn case_from_row(row: &SqliteRow) -> Result<Case> {
    let case_id: String = row.get("case_id");
    let priority: String = row.get("priority");
    let start_time: String = row.get("start_time");
    let deadline_time: String = row.get("deadline_time");
    let status: String = row.get("status");

    Ok(Case {
        case_id: parse_uuid(&case_id, "case_id")?,
        title: row.get("title"),
        priority: priority.parse()?,
        start_time: from_db_timestamp(&start_time)?,
        deadline_time: from_db_timestamp(&deadline_time)?,
        status: status.parse()?,
    })
}
