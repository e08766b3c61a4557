//! Job submission: persist upload, record PENDING job, enqueue work

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::processing::{WorkItem, WorkQueue};
use crate::storage::{JobStore, UploadStore};
use crate::types::{JobRecord, SubmitResponse};

/// Accepts documents for analysis without waiting on the engine
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<JobStore>,
    uploads: UploadStore,
    queue: Arc<dyn WorkQueue>,
}

impl SubmissionService {
    pub fn new(store: Arc<JobStore>, uploads: UploadStore, queue: Arc<dyn WorkQueue>) -> Self {
        Self {
            store,
            uploads,
            queue,
        }
    }

    /// Submit a document and query
    ///
    /// The job row is committed before the work item is enqueued. If the
    /// enqueue fails the job is marked FAILED and the error is returned.
    pub async fn submit(&self, file_name: &str, data: &[u8], query: &str) -> Result<SubmitResponse> {
        if query.trim().is_empty() {
            return Err(Error::validation("Query must not be empty"));
        }
        if data.is_empty() {
            return Err(Error::validation("Uploaded file is empty"));
        }

        let file_path = self.uploads.save(data).await?;

        let job = JobRecord::new(file_name.to_string(), query.to_string(), file_path.clone());
        if let Err(e) = self.store.create_job(&job) {
            if let Err(cleanup) = self.uploads.remove(&file_path).await {
                tracing::warn!("Failed to remove orphaned upload {}: {}", file_path.display(), cleanup);
            }
            return Err(e);
        }

        tracing::info!(
            "Created job {} for '{}' ({} bytes)",
            job.id,
            file_name,
            data.len()
        );

        let item = WorkItem {
            job_id: job.id,
            query: job.query.clone(),
            file_path,
        };

        if let Err(e) = self.queue.enqueue(item).await {
            tracing::error!("Failed to enqueue job {}: {}", job.id, e);
            if let Err(mark) = self.store.fail_job(job.id, &e.to_string()) {
                tracing::error!("Job {} left PENDING after enqueue failure: {}", job.id, mark);
            }
            return Err(e);
        }

        Ok(SubmitResponse::pending(job.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{channel_queue, WorkSource};
    use crate::types::JobStatus;

    fn service(dir: &std::path::Path) -> (SubmissionService, Arc<JobStore>, crate::processing::ChannelReceiver) {
        let store = Arc::new(JobStore::in_memory().unwrap());
        let (queue, source) = channel_queue(4);
        let service = SubmissionService::new(
            store.clone(),
            UploadStore::new(dir.join("uploads")),
            Arc::new(queue),
        );
        (service, store, source)
    }

    #[tokio::test]
    async fn test_submit_creates_pending_job_and_enqueues() {
        let dir = tempfile::tempdir().unwrap();
        let (service, store, mut source) = service(dir.path());

        let response = service
            .submit("report.pdf", b"Revenue rose", "Summarize risk")
            .await
            .unwrap();
        assert_eq!(response.status, JobStatus::Pending);
        assert!(response.message.contains(&response.job_id.to_string()));

        let job = store.get_job(response.job_id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.result_json.is_none());
        assert_ne!(job.file_path.file_name().unwrap(), "report.pdf");
        assert_eq!(std::fs::read(&job.file_path).unwrap(), b"Revenue rose");

        let item = source.dequeue().await.unwrap();
        assert_eq!(item.job_id, response.job_id);
        assert_eq!(item.query, "Summarize risk");
        assert_eq!(item.file_path, job.file_path);
    }

    #[tokio::test]
    async fn test_same_filename_never_collides() {
        let dir = tempfile::tempdir().unwrap();
        let (service, store, _source) = service(dir.path());

        let a = service.submit("report.pdf", b"first", "q").await.unwrap();
        let b = service.submit("report.pdf", b"second", "q").await.unwrap();

        let a = store.get_job(a.job_id).unwrap().unwrap();
        let b = store.get_job(b.job_id).unwrap().unwrap();
        assert_ne!(a.file_path, b.file_path);
        assert_eq!(std::fs::read(&a.file_path).unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_empty_query_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (service, store, _source) = service(dir.path());

        for query in ["", "   "] {
            let result = service.submit("report.pdf", b"data", query).await;
            assert!(matches!(result, Err(Error::Validation(_))));
        }

        assert_eq!(store.stats().unwrap().total, 0);
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn test_empty_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (service, store, _source) = service(dir.path());

        let result = service.submit("report.pdf", b"", "q").await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(store.stats().unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_full_queue_fails_job_instead_of_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JobStore::in_memory().unwrap());
        let (queue, _source) = channel_queue(1);
        let service = SubmissionService::new(
            store.clone(),
            UploadStore::new(dir.path().join("uploads")),
            Arc::new(queue),
        );

        let first = service.submit("a.pdf", b"data", "q").await.unwrap();
        let second = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            service.submit("b.pdf", b"data", "q"),
        )
        .await
        .expect("submission must not wait on the worker");
        assert!(matches!(second, Err(Error::Queue(_))));

        let stats = store.stats().unwrap();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(
            store.get_job(first.job_id).unwrap().unwrap().status,
            JobStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_enqueue_failure_marks_job_failed() {
        let dir = tempfile::tempdir().unwrap();
        let (service, store, source) = service(dir.path());
        drop(source);

        let result = service.submit("report.pdf", b"data", "q").await;
        assert!(matches!(result, Err(Error::Queue(_))));

        let jobs = store.recent_jobs(10).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, JobStatus::Failed);
        assert!(jobs[0].error.is_some());
    }
}
