//! Database models and queries

pub mod cases;
pub mod contractors;
pub mod event_log;
pub mod init;
pub mod models;
pub mod submissions;

pub use cases::*;
pub use contractors::*;
pub use event_log::*;
pub use init::*;
pub use models::*;
pub use submissions::*;

use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::{Error, Result};

/// Begin a transaction holding the write lock from the start
///
/// A deferred transaction that reads and then writes fails with
/// SQLITE_BUSY_SNAPSHOT when another connection commits in between, and
/// busy_timeout never retries that. `BEGIN IMMEDIATE` waits for the lock up
/// front instead.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Parse a UUID column value
pub(crate) fn parse_uuid(raw: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| Error::Internal(format!("Invalid UUID in column {}: {}", column, e)))
}
