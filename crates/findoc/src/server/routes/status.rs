//! Job status endpoint

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::StatusResponse;

/// GET /status/:job_id - Current status and, once completed, the result
pub async fn get_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    Ok(Json(state.statuses().status(&job_id)?))
}
