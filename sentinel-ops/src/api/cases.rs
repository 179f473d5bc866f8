//! Case endpoints: create, list, submit, review queue, export

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sentinel_common::db::{create_case, list_cases, Case, NewCase};
use sentinel_common::evidence::EvidenceAnalysis;
use sentinel_common::ValidationResult;
use uuid::Uuid;

use crate::services::{
    export_case, review_queue, ExportFormat, ExportRecord, ScoredSubmission, SubmitRequest,
};
use crate::{ApiResult, AppState};

/// POST /cases/:case_id/submit response
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub submission_id: Uuid,
    pub submission_hash: String,
    pub validation: ValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceAnalysis>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: Option<String>,
}

/// POST /cases
pub async fn create_case_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewCase>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Case>)> {
    let Json(new_case) = payload?;
    let case = create_case(&state.db, new_case).await?;
    Ok((StatusCode::CREATED, Json(case)))
}

/// GET /cases
pub async fn list_cases_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<Case>>> {
    Ok(Json(list_cases(&state.db).await?))
}

/// POST /cases/:case_id/submit
pub async fn submit_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitResponse>> {
    let Path(case_id) = path?;
    let Json(request) = payload?;
    let outcome = state.intake.submit(case_id, request).await?;

    Ok(Json(SubmitResponse {
        submission_id: outcome.submission.submission_id,
        submission_hash: outcome.submission.submission_hash,
        validation: outcome.validation,
        evidence: outcome.evidence,
    }))
}

/// GET /cases/:case_id/submissions
pub async fn review_queue_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<ScoredSubmission>>> {
    let Path(case_id) = path?;
    Ok(Json(review_queue(&state.db, case_id).await?))
}

/// POST /cases/:case_id/export?format=json|csv
pub async fn export_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ExportRecord>>> {
    let Path(case_id) = path?;
    let Query(query) = query?;
    let format: ExportFormat = match query.format {
        Some(raw) => raw.parse()?,
        None => Default::default(),
    };
    Ok(Json(export_case(&state.db, &state.case_locks, case_id, format).await?))
}

pub fn case_routes() -> Router<AppState> {
    Router::new()
        .route("/cases", post(create_case_handler).get(list_cases_handler))
        .route("/cases/:case_id/submit", post(submit_handler))
        .route("/cases/:case_id/submissions", get(review_queue_handler))
        .route("/cases/:case_id/export", post(export_handler))
}
