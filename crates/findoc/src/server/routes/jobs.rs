//! Job listing endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::JobListResponse;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

/// GET /jobs - Recent jobs and queue stats
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<JobListResponse>> {
    Ok(Json(state.statuses().list(params.limit)?))
}
