//! Background worker for analysis jobs
//!
//! Each job runs claim -> extract -> truncate -> analyze -> parse -> persist,
//! strictly in that order. Jobs are independent; up to `workers` run at once.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use uuid::Uuid;

use crate::analysis::AnalysisEngine;
use crate::config::ProcessingConfig;
use crate::error::{Error, Result};
use crate::ingestion::DocumentExtractor;
use crate::storage::{ClaimOutcome, JobStore};
use crate::types::AnalysisResult;

use super::queue::{WorkItem, WorkSource};

/// How a single work item ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Result persisted, job COMPLETED
    Completed,
    /// Job marked FAILED with this reason
    Failed(String),
    /// Nothing written (redelivery, unknown id, already terminal)
    Skipped,
}

/// Worker tuning, taken from `[processing]`
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub max_chars: usize,
    pub workers: usize,
    pub engine_timeout: Duration,
    pub delete_uploads: bool,
}

impl From<&ProcessingConfig> for WorkerOptions {
    fn from(config: &ProcessingConfig) -> Self {
        Self {
            max_chars: config.max_chars,
            workers: config.workers.max(1),
            engine_timeout: Duration::from_secs(config.engine_timeout_secs),
            delete_uploads: config.delete_uploads,
        }
    }
}

/// Hard character cutoff; may split mid-sentence or mid-number
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Jobs currently being analyzed, shared with the status listing
#[derive(Debug, Clone, Default)]
pub struct ActiveJobs {
    jobs: Arc<DashMap<Uuid, Instant>>,
}

impl ActiveJobs {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn track(&self, job_id: Uuid) -> ActiveGuard {
        let started = Instant::now();
        self.jobs.insert(job_id, started);
        ActiveGuard {
            jobs: self.jobs.clone(),
            job_id,
            started,
        }
    }
}

/// Drops the in-flight entry on every exit path, unwinding included
struct ActiveGuard {
    jobs: Arc<DashMap<Uuid, Instant>>,
    job_id: Uuid,
    started: Instant,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.jobs.remove(&self.job_id);
    }
}

/// Worker for processing analysis jobs in the background
pub struct AnalysisWorker {
    store: Arc<JobStore>,
    extractor: Arc<dyn DocumentExtractor>,
    engine: Arc<dyn AnalysisEngine>,
    options: WorkerOptions,
    active: ActiveJobs,
}

impl AnalysisWorker {
    pub fn new(
        store: Arc<JobStore>,
        extractor: Arc<dyn DocumentExtractor>,
        engine: Arc<dyn AnalysisEngine>,
        options: WorkerOptions,
    ) -> Self {
        Self {
            store,
            extractor,
            engine,
            options,
            active: ActiveJobs::default(),
        }
    }

    /// Handle on the in-flight job set
    pub fn active(&self) -> ActiveJobs {
        self.active.clone()
    }

    /// Number of jobs in flight
    pub fn active_jobs(&self) -> usize {
        self.active.len()
    }

    /// Pull items until the source closes
    pub async fn run<S: WorkSource>(self: Arc<Self>, mut source: S) {
        tracing::info!(
            "Analysis worker started: {} concurrent jobs, {} char budget, {}s engine timeout",
            self.options.workers,
            self.options.max_chars,
            self.options.engine_timeout.as_secs()
        );

        let semaphore = Arc::new(Semaphore::new(self.options.workers));

        while let Some(item) = source.dequeue().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let worker = self.clone();
            tokio::spawn(async move {
                let _permit = permit;
                worker.process(item).await;
            });
        }

        tracing::info!("Work source closed, analysis worker stopping");
    }

    /// Process one work item end to end
    pub async fn process(&self, item: WorkItem) -> JobOutcome {
        let job_id = item.job_id;

        match self.store.claim_job(job_id) {
            Ok(ClaimOutcome::Claimed) => {}
            Ok(ClaimOutcome::AlreadyClaimed) => {
                tracing::warn!("Job {} is already being processed, skipping redelivery", job_id);
                return JobOutcome::Skipped;
            }
            Ok(ClaimOutcome::Terminal(status)) => {
                tracing::warn!("Job {} is already {}, skipping redelivery", job_id, status);
                return JobOutcome::Skipped;
            }
            Ok(ClaimOutcome::Missing) => {
                tracing::warn!("Job {} not found in store, dropping work item", job_id);
                return JobOutcome::Skipped;
            }
            Err(e) => {
                tracing::error!("Failed to claim job {}: {}", job_id, e);
                return JobOutcome::Skipped;
            }
        }

        tracing::info!("Processing job {} ({})", job_id, item.file_path.display());
        let guard = self.active.track(job_id);

        // Own task so a panic in extraction or the engine still fails the job
        let analysis = tokio::spawn(analyze_job(
            self.extractor.clone(),
            self.engine.clone(),
            self.options.clone(),
            item.clone(),
        ));
        let result = match analysis.await {
            Ok(result) => result,
            Err(e) => Err(Error::Internal(format!("Analysis task failed: {}", e))),
        };

        let outcome = match result {
            Ok(result_json) => match self.store.complete_job(job_id, &result_json) {
                Ok(true) => JobOutcome::Completed,
                Ok(false) => {
                    tracing::warn!("Job {} was already terminal, result discarded", job_id);
                    JobOutcome::Skipped
                }
                Err(e) => self.record_failure(job_id, &format!("Failed to store result: {}", e)),
            },
            Err(e) => self.record_failure(job_id, &e.to_string()),
        };

        let elapsed = guard.started.elapsed().as_secs_f64();
        drop(guard);
        match &outcome {
            JobOutcome::Completed => tracing::info!("Job {} completed in {:.1}s", job_id, elapsed),
            JobOutcome::Failed(reason) => {
                tracing::error!("Job {} failed after {:.1}s: {}", job_id, elapsed, reason)
            }
            JobOutcome::Skipped => {}
        }

        if self.options.delete_uploads && outcome != JobOutcome::Skipped {
            if let Err(e) = tokio::fs::remove_file(&item.file_path).await {
                tracing::warn!("Failed to remove upload {}: {}", item.file_path.display(), e);
            }
        }

        outcome
    }

    fn record_failure(&self, job_id: Uuid, reason: &str) -> JobOutcome {
        match self.store.fail_job(job_id, reason) {
            Ok(true) => JobOutcome::Failed(reason.to_string()),
            Ok(false) => {
                tracing::warn!("Job {} was already terminal, failure not recorded", job_id);
                JobOutcome::Skipped
            }
            Err(e) => {
                // Claim stays set; released on next startup
                tracing::error!("Failed to mark job {} as failed: {}", job_id, e);
                JobOutcome::Failed(reason.to_string())
            }
        }
    }
}

/// Extract, truncate, analyze, parse; returns the JSON to persist
async fn analyze_job(
    extractor: Arc<dyn DocumentExtractor>,
    engine: Arc<dyn AnalysisEngine>,
    options: WorkerOptions,
    item: WorkItem,
) -> Result<String> {
    let path = item.file_path.clone();
    let text = tokio::task::spawn_blocking(move || extractor.extract_text(&path))
        .await
        .map_err(|e| Error::Internal(format!("Extraction task failed: {}", e)))??;

    let document_text = truncate_chars(&text, options.max_chars);
    if document_text.len() < text.len() {
        tracing::debug!(
            "Job {}: document truncated to {} chars",
            item.job_id,
            options.max_chars
        );
    }

    let raw = timeout(options.engine_timeout, engine.analyze(&item.query, document_text))
        .await
        .map_err(|_| {
            Error::engine(format!(
                "Analysis timed out after {}s",
                options.engine_timeout.as_secs()
            ))
        })??;

    AnalysisResult::parse(&raw)?.to_json()
}
