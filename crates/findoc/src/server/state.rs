//! Application state for the analysis server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::analysis::AnalysisEngine;
use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::ingestion::DocumentExtractor;
use crate::processing::{
    channel_queue, AnalysisWorker, ChannelQueue, WorkItem, WorkQueue, WorkerOptions,
};
use crate::service::{StatusService, SubmissionService};
use crate::storage::{JobStore, UploadStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AnalyzerConfig,
    /// Submission path (upload + job row + enqueue)
    submissions: SubmissionService,
    /// Status and listing
    statuses: StatusService,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create state around an explicit engine and extractor
    ///
    /// Opens the job store, starts the worker and re-enqueues jobs left
    /// PENDING by a previous run.
    pub async fn with_engine(
        config: AnalyzerConfig,
        engine: Arc<dyn AnalysisEngine>,
        extractor: Arc<dyn DocumentExtractor>,
    ) -> Result<Self> {
        tracing::info!("Initializing analysis service state...");

        let data_dir = &config.storage.data_dir;
        tokio::fs::create_dir_all(data_dir).await.map_err(|e| {
            Error::Storage(format!("Failed to create data directory {}: {}", data_dir.display(), e))
        })?;

        let db_path = config.storage.database_path();
        let store = Arc::new(JobStore::new(&db_path)?);
        tracing::info!("Job store opened at {}", db_path.display());

        let uploads = UploadStore::new(data_dir.clone());
        let (channel, source) = channel_queue(config.processing.queue_capacity);

        let worker = Arc::new(AnalysisWorker::new(
            store.clone(),
            extractor,
            engine,
            WorkerOptions::from(&config.processing),
        ));
        let active = worker.active();
        tokio::spawn(worker.run(source));

        Self::recover_pending(store.clone(), channel.clone())?;

        let queue: Arc<dyn WorkQueue> = Arc::new(channel);
        let state = Self {
            inner: Arc::new(AppStateInner {
                submissions: SubmissionService::new(store.clone(), uploads, queue.clone()),
                statuses: StatusService::new(store, queue, active),
                config,
                ready: RwLock::new(false),
            }),
        };

        state.set_ready(true);
        tracing::info!("Analysis service state initialized");
        Ok(state)
    }

    /// Re-enqueue PENDING jobs after a restart
    ///
    /// Items are fed from a background task that waits for queue capacity,
    /// so startup never stalls behind a large backlog.
    fn recover_pending(store: Arc<JobStore>, queue: ChannelQueue) -> Result<()> {
        let released = store.release_claims()?;
        if released > 0 {
            tracing::warn!("Released {} stale job claims from a previous run", released);
        }

        let pending = store.pending_jobs()?;
        if pending.is_empty() {
            return Ok(());
        }

        tracing::info!("Re-queuing {} pending jobs", pending.len());
        tokio::spawn(async move {
            for job in pending {
                let job_id = job.id;
                let item = WorkItem {
                    job_id,
                    query: job.query,
                    file_path: job.file_path,
                };
                if let Err(e) = queue.enqueue_waiting(item).await {
                    tracing::error!("Failed to re-queue job {}: {}", job_id, e);
                    if let Err(mark) = store.fail_job(job_id, &e.to_string()) {
                        tracing::error!("Job {} left PENDING: {}", job_id, mark);
                    }
                }
            }
        });

        Ok(())
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.inner.config
    }

    pub fn submissions(&self) -> &SubmissionService {
        &self.inner.submissions
    }

    pub fn statuses(&self) -> &StatusService {
        &self.inner.statuses
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
