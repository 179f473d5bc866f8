//! Database initialization
//!
//! Creates the schema on first run. The event table is append-only: triggers
//! abort any UPDATE or DELETE, so a stored event cannot change even through
//! raw SQL.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Current schema version
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Open (creating if needed) the database file and ensure the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // WAL lets readers proceed while a writer holds the lock
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    Ok(pool)
}

/// In-memory database with the full schema
///
/// Limited to one connection: every SQLite in-memory connection is a separate
/// database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables, indexes and immutability triggers (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_contractors_table(pool).await?;
    create_cases_table(pool).await?;
    create_submissions_table(pool).await?;
    create_submission_events_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(CURRENT_SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_contractors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contractors (
            contractor_id TEXT PRIMARY KEY,
            handle TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS contractors_immutable
        BEFORE UPDATE ON contractors
        BEGIN
            SELECT RAISE(ABORT, 'contractors are immutable');
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_cases_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cases (
            case_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            priority TEXT NOT NULL CHECK (priority IN ('LOW', 'MED', 'HIGH')),
            start_time TEXT NOT NULL,
            deadline_time TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'OPEN' CHECK (status IN ('OPEN', 'CLOSED'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            submission_id TEXT PRIMARY KEY,
            case_id TEXT NOT NULL REFERENCES cases(case_id),
            contractor_id TEXT NOT NULL REFERENCES contractors(contractor_id),
            chain TEXT NOT NULL,
            address TEXT NOT NULL,
            scam_type TEXT NOT NULL,
            source_url TEXT NOT NULL,
            confidence_score INTEGER NOT NULL CHECK (confidence_score BETWEEN 1 AND 5),
            created_at TEXT NOT NULL,
            raw_payload_json TEXT NOT NULL,
            submission_hash TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_submissions_case_address ON submissions(case_id, chain, address)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_submissions_contractor ON submissions(contractor_id)",
    )
    .execute(pool)
    .await?;

    // Status lives in the event log; the row itself never changes
    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS submissions_immutable
        BEFORE UPDATE ON submissions
        BEGIN
            SELECT RAISE(ABORT, 'submissions are immutable');
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_submission_events_table(pool: &SqlitePool) -> Result<()> {
    // seq records insertion order and breaks created_at ties
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submission_events (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT NOT NULL UNIQUE,
            submission_id TEXT NOT NULL REFERENCES submissions(submission_id),
            event_type TEXT NOT NULL,
            event_payload_json TEXT NOT NULL,
            created_at TEXT NOT NULL,
            actor TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_events_submission ON submission_events(submission_id, created_at, seq)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS submission_events_no_update
        BEFORE UPDATE ON submission_events
        BEGIN
            SELECT RAISE(ABORT, 'submission_events is append-only');
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS submission_events_no_delete
        BEFORE DELETE ON submission_events
        BEGIN
            SELECT RAISE(ABORT, 'submission_events is append-only');
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
