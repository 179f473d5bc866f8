//! POST /contractors

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use sentinel_common::db::{create_contractor, Contractor};

use crate::{error::ApiError, ApiResult, AppState};

const MAX_HANDLE_LEN: usize = 64;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateContractorRequest {
    pub handle: String,
}

/// Register a contractor
pub async fn create_contractor_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateContractorRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Contractor>)> {
    let Json(request) = payload?;
    let handle = request.handle.trim();
    if handle.is_empty() || handle.chars().count() > MAX_HANDLE_LEN {
        return Err(ApiError::BadRequest(format!(
            "handle must be 1-{} characters",
            MAX_HANDLE_LEN
        )));
    }

    let contractor = create_contractor(&state.db, handle).await?;
    Ok((StatusCode::CREATED, Json(contractor)))
}

pub fn contractor_routes() -> Router<AppState> {
    Router::new().route("/contractors", post(create_contractor_handler))
}
