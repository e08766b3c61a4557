//! Analysis job record and lifecycle status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::Result;

/// Job status
///
/// Only `Pending -> Completed` and `Pending -> Failed` are valid transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(JobStatus::Pending),
            "COMPLETED" => Some(JobStatus::Completed),
            "FAILED" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted analysis job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    /// Client-supplied filename, informational only
    pub file_name: String,
    pub query: String,
    /// Where the upload was stored
    pub file_path: PathBuf,
    pub status: JobStatus,
    /// Re-serialized analysis result, set only with `Completed`
    pub result_json: Option<String>,
    /// Failure reason, set only with `Failed`
    pub error: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// New PENDING job with a fresh id
    pub fn new(file_name: String, query: String, file_path: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            file_name,
            query,
            file_path,
            status: JobStatus::Pending,
            result_json: None,
            error: None,
            claimed_at: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Parsed result payload, `None` unless completed
    pub fn result(&self) -> Result<Option<serde_json::Value>> {
        match &self.result_json {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }
}
