//! API routes for the analysis server

pub mod analyze;
pub mod jobs;
pub mod status;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Submission - with larger body limit for file uploads
        .route(
            "/analyze",
            post(analyze::analyze_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/status/:job_id", get(status::get_status))
        .route("/jobs", get(jobs::list_jobs))
}
