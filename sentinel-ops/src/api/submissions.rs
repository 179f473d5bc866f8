//! Submission endpoints: detail and manager actions

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sentinel_common::EventType;
use uuid::Uuid;

use crate::services::{submission_detail, ActionRequest, SubmissionDetail};
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub ok: bool,
    pub event_id: Uuid,
    pub submission_id: Uuid,
    pub event_type: EventType,
}

/// GET /submissions/:submission_id
pub async fn get_submission_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<SubmissionDetail>> {
    let Path(submission_id) = path?;
    Ok(Json(submission_detail(&state.db, submission_id).await?))
}

/// POST /submissions/:submission_id/actions
pub async fn action_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> ApiResult<Json<ActionResponse>> {
    let Path(submission_id) = path?;
    let Json(request) = payload?;
    let event = state.intake.apply_action(submission_id, request).await?;

    Ok(Json(ActionResponse {
        ok: true,
        event_id: event.event_id(),
        submission_id,
        event_type: event.event_type().clone(),
    }))
}

pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/submissions/:submission_id", get(get_submission_handler))
        .route("/submissions/:submission_id/actions", post(action_handler))
}
