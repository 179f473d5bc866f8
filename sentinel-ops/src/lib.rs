//! sentinel-ops library interface
//!
//! Exposes the service layer and router for the binary and integration tests.

pub mod api;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sentinel_common::db::EventLog;
use sentinel_common::KeyedLocks;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::{EvidenceFetcher, IntakeOrchestrator};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Append-only submission event log
    pub event_log: EventLog,
    /// Per-case write serialization shared by intake and export
    pub case_locks: KeyedLocks,
    /// Submission intake and manager actions
    pub intake: IntakeOrchestrator,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        let event_log = EventLog::new(db.clone());
        let case_locks = KeyedLocks::new();
        let intake = IntakeOrchestrator::new(event_log.clone(), case_locks.clone());

        Self {
            db,
            event_log,
            case_locks,
            intake,
            startup_time: Utc::now(),
        }
    }

    /// Turn on evidence enrichment after intake
    pub fn with_evidence_fetcher(mut self, fetcher: Arc<dyn EvidenceFetcher>) -> Self {
        self.intake = self.intake.with_fetcher(fetcher);
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::contractor_routes())
        .merge(api::case_routes())
        .merge(api::submission_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
