//! Contractor queries

use sqlx::{Executor, Row, Sqlite};
use uuid::Uuid;

use super::{parse_uuid, Contractor};
use crate::time::{from_db_timestamp, now, to_db_timestamp};
use crate::Result;

/// Register a contractor
pub async fn create_contractor<'e, E>(executor: E, handle: &str) -> Result<Contractor>
where
    E: Executor<'e, Database = Sqlite>,
{
    let contractor = Contractor {
        contractor_id: Uuid::new_v4(),
        handle: handle.to_string(),
        created_at: now(),
    };

    sqlx::query("INSERT INTO contractors (contractor_id, handle, created_at) VALUES (?, ?, ?)")
        .bind(contractor.contractor_id.to_string())
        .bind(&contractor.handle)
        .bind(to_db_timestamp(&contractor.created_at))
        .execute(executor)
        .await?;

    tracing::info!(contractor_id = %contractor.contractor_id, handle = %contractor.handle, "Contractor created");
    Ok(contractor)
}

/// Load a contractor by id
pub async fn get_contractor<'e, E>(executor: E, contractor_id: Uuid) -> Result<Option<Contractor>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        "SELECT contractor_id, handle, created_at FROM contractors WHERE contractor_id = ?",
    )
    .bind(contractor_id.to_string())
    .fetch_optional(executor)
    .await?;

    match row {
        Some(row) => {
            let id: String = row.get("contractor_id");
            let created_at: String = row.get("created_at");
            Ok(Some(Contractor {
                contractor_id: parse_uuid(&id, "contractor_id")?,
                handle: row.get("handle"),
                created_at: from_db_timestamp(&created_at)?,
            }))
        }
        None => Ok(None),
    }
}
