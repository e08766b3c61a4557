//! API response types

use serde::Serialize;
use uuid::Uuid;

use super::job::{JobRecord, JobStatus};

/// Response from POST /analyze
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub message: String,
}

impl SubmitResponse {
    pub fn pending(job_id: Uuid) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            message: format!(
                "Analysis started. Use /status/{} to check progress.",
                job_id
            ),
        }
    }
}

/// Response from GET /status/:job_id
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    /// Parsed analysis, present only when completed
    pub result: Option<serde_json::Value>,
    /// Failure reason, present only when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Job summary for listings (result payload omitted)
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub job_id: Uuid,
    pub file_name: String,
    pub query: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<&JobRecord> for JobSummary {
    fn from(job: &JobRecord) -> Self {
        Self {
            job_id: job.id,
            file_name: job.file_name.clone(),
            query: job.query.clone(),
            status: job.status,
            error: job.error.clone(),
            created_at: job.created_at.to_rfc3339(),
            completed_at: job.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Counts per job status
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct JobStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Response from GET /jobs
#[derive(Debug, Clone, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobSummary>,
    pub stats: JobStats,
    /// Work items waiting for a worker
    pub queued: usize,
    /// Jobs currently being analyzed
    pub processing: usize,
}
