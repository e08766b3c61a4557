//! Job status and listing

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::processing::{ActiveJobs, WorkQueue};
use crate::storage::JobStore;
use crate::types::{JobListResponse, JobStatus, JobSummary, StatusResponse};

/// Default page size for job listings
pub const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 500;

/// Read-only view of job state
#[derive(Clone)]
pub struct StatusService {
    store: Arc<JobStore>,
    queue: Arc<dyn WorkQueue>,
    active: ActiveJobs,
}

impl StatusService {
    pub fn new(store: Arc<JobStore>, queue: Arc<dyn WorkQueue>, active: ActiveJobs) -> Self {
        Self {
            store,
            queue,
            active,
        }
    }

    /// Current status of a job; unknown or malformed ids are `JobNotFound`
    pub fn status(&self, job_id: &str) -> Result<StatusResponse> {
        let id = Uuid::parse_str(job_id).map_err(|_| Error::JobNotFound(job_id.to_string()))?;
        let job = self
            .store
            .get_job(id)?
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;

        let result = match job.status {
            JobStatus::Completed => job.result()?,
            _ => None,
        };
        let error = match job.status {
            JobStatus::Failed => job.error.clone(),
            _ => None,
        };

        Ok(StatusResponse {
            job_id: job.id,
            status: job.status,
            result,
            error,
        })
    }

    /// Most recent jobs with per-status counts
    pub fn list(&self, limit: Option<usize>) -> Result<JobListResponse> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let jobs = self.store.recent_jobs(limit)?;

        Ok(JobListResponse {
            jobs: jobs.iter().map(JobSummary::from).collect(),
            stats: self.store.stats()?,
            queued: self.queue.depth(),
            processing: self.active.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::channel_queue;
    use crate::types::JobRecord;
    use std::path::PathBuf;

    const VALID: &str = r#"{"executive_summary":"x","key_financial_metrics":[],"risk_level":"High","risk_explanation":"y","investment_recommendation":"Sell","confidence_score":40}"#;

    fn setup() -> (StatusService, Arc<JobStore>) {
        let store = Arc::new(JobStore::in_memory().unwrap());
        let (queue, _source) = channel_queue(4);
        (StatusService::new(store.clone(), Arc::new(queue), ActiveJobs::default()), store)
    }

    fn create(store: &JobStore) -> Uuid {
        let job = JobRecord::new("a.pdf".to_string(), "q".to_string(), PathBuf::from("data/a.pdf"));
        store.create_job(&job).unwrap();
        job.id
    }

    #[test]
    fn test_unknown_and_malformed_ids_are_not_found() {
        let (service, _store) = setup();

        let unknown = service.status(&Uuid::new_v4().to_string());
        assert!(matches!(unknown, Err(Error::JobNotFound(_))));

        let malformed = service.status("not-a-uuid");
        assert!(matches!(malformed, Err(Error::JobNotFound(_))));
    }

    #[test]
    fn test_pending_has_no_result() {
        let (service, store) = setup();
        let id = create(&store);

        let status = service.status(&id.to_string()).unwrap();
        assert_eq!(status.status, JobStatus::Pending);
        assert!(status.result.is_none());
        assert!(status.error.is_none());
    }

    #[test]
    fn test_completed_has_parsed_result() {
        let (service, store) = setup();
        let id = create(&store);
        store.complete_job(id, VALID).unwrap();

        let status = service.status(&id.to_string()).unwrap();
        assert_eq!(status.status, JobStatus::Completed);
        assert_eq!(status.result.unwrap()["risk_level"], "High");
    }

    #[test]
    fn test_failed_has_reason_and_no_result() {
        let (service, store) = setup();
        let id = create(&store);
        store.fail_job(id, "engine down").unwrap();

        let status = service.status(&id.to_string()).unwrap();
        assert_eq!(status.status, JobStatus::Failed);
        assert!(status.result.is_none());
        assert_eq!(status.error.as_deref(), Some("engine down"));
    }

    #[test]
    fn test_list_counts_and_limit() {
        let (service, store) = setup();
        let first = create(&store);
        create(&store);
        create(&store);
        store.fail_job(first, "bad").unwrap();

        let listing = service.list(Some(2)).unwrap();
        assert_eq!(listing.jobs.len(), 2);
        assert_eq!(listing.stats.total, 3);
        assert_eq!(listing.stats.pending, 2);
        assert_eq!(listing.stats.failed, 1);
        assert_eq!(listing.processing, 0);
    }
}
