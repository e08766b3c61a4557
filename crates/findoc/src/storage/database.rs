//! SQLite job store
//!
//! Durable record of every submitted analysis job. Status writes are
//! conditional on the job still being PENDING, so a terminal job is never
//! rewritten.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{JobRecord, JobStats, JobStatus};

const JOB_COLUMNS: &str = "id, file_name, query, file_path, status, result_json, error, \
                           claimed_at, created_at, updated_at, completed_at";

/// Outcome of trying to claim a job for processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller now owns the job
    Claimed,
    /// Another worker holds the claim
    AlreadyClaimed,
    /// Job already finished
    Terminal(JobStatus),
    /// No job with this id
    Missing,
}

/// SQLite-based job store
pub struct JobStore {
    conn: Arc<Mutex<Connection>>,
}

impl JobStore {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::database(format!("Failed to open database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.migrate()?;
        Ok(store)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(format!("Failed to open in-memory database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.migrate()?;
        Ok(store)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
        "#).map_err(|e| Error::database(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS analysis_jobs (
                id TEXT PRIMARY KEY,
                file_name TEXT NOT NULL,
                query TEXT NOT NULL,
                file_path TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'PENDING',
                result_json TEXT,
                error TEXT,
                claimed_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                completed_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_analysis_jobs_status ON analysis_jobs(status);
            CREATE INDEX IF NOT EXISTS idx_analysis_jobs_created_at ON analysis_jobs(created_at);
        "#).map_err(|e| Error::database(format!("Failed to create tables: {}", e)))?;

        Ok(())
    }

    /// Insert a new PENDING job
    pub fn create_job(&self, job: &JobRecord) -> Result<()> {
        if job.status != JobStatus::Pending || job.result_json.is_some() {
            return Err(Error::internal(format!(
                "Job {} must be created PENDING without a result",
                job.id
            )));
        }

        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO analysis_jobs (
                id, file_name, query, file_path, status, result_json, error,
                claimed_at, created_at, updated_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL, NULL, ?6, ?7, NULL)
            "#,
            params![
                job.id.to_string(),
                job.file_name,
                job.query,
                job.file_path.to_string_lossy(),
                job.status.as_str(),
                job.created_at.to_rfc3339(),
                job.updated_at.to_rfc3339(),
            ],
        ).map_err(|e| Error::database(format!("Failed to create job: {}", e)))?;

        Ok(())
    }

    /// Get a job by ID
    pub fn get_job(&self, job_id: Uuid) -> Result<Option<JobRecord>> {
        let conn = self.conn.lock();
        Self::fetch(&conn, job_id)
    }

    fn fetch(conn: &Connection, job_id: Uuid) -> Result<Option<JobRecord>> {
        let record = conn
            .query_row(
                &format!("SELECT {} FROM analysis_jobs WHERE id = ?1", JOB_COLUMNS),
                params![job_id.to_string()],
                row_to_job_record,
            )
            .optional()
            .map_err(|e| Error::database(format!("Failed to get job: {}", e)))?;

        Ok(record)
    }

    /// Claim a PENDING job for exclusive processing
    pub fn claim_job(&self, job_id: Uuid) -> Result<ClaimOutcome> {
        let conn = self.conn.lock();
        let now = Utc::now().to_rfc3339();

        let updated = conn.execute(
            r#"
            UPDATE analysis_jobs SET claimed_at = ?2, updated_at = ?2
            WHERE id = ?1 AND status = 'PENDING' AND claimed_at IS NULL
            "#,
            params![job_id.to_string(), now],
        ).map_err(|e| Error::database(format!("Failed to claim job: {}", e)))?;

        if updated == 1 {
            return Ok(ClaimOutcome::Claimed);
        }

        Ok(match Self::fetch(&conn, job_id)? {
            None => ClaimOutcome::Missing,
            Some(job) if job.status.is_terminal() => ClaimOutcome::Terminal(job.status),
            Some(_) => ClaimOutcome::AlreadyClaimed,
        })
    }

    /// Write the result and mark COMPLETED; `false` if the job was not PENDING
    pub fn complete_job(&self, job_id: Uuid, result_json: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let now = Utc::now().to_rfc3339();

        let updated = conn.execute(
            r#"
            UPDATE analysis_jobs SET
                status = 'COMPLETED',
                result_json = ?2,
                error = NULL,
                updated_at = ?3,
                completed_at = ?3
            WHERE id = ?1 AND status = 'PENDING'
            "#,
            params![job_id.to_string(), result_json, now],
        ).map_err(|e| Error::database(format!("Failed to complete job: {}", e)))?;

        Ok(updated == 1)
    }

    /// Mark FAILED with a reason; `false` if the job was not PENDING
    pub fn fail_job(&self, job_id: Uuid, reason: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let now = Utc::now().to_rfc3339();

        let updated = conn.execute(
            r#"
            UPDATE analysis_jobs SET
                status = 'FAILED',
                result_json = NULL,
                error = ?2,
                updated_at = ?3,
                completed_at = ?3
            WHERE id = ?1 AND status = 'PENDING'
            "#,
            params![job_id.to_string(), reason, now],
        ).map_err(|e| Error::database(format!("Failed to mark job failed: {}", e)))?;

        Ok(updated == 1)
    }

    /// Drop claims on PENDING jobs (startup recovery after a crash)
    pub fn release_claims(&self) -> Result<usize> {
        let conn = self.conn.lock();

        let released = conn.execute(
            "UPDATE analysis_jobs SET claimed_at = NULL WHERE status = 'PENDING' AND claimed_at IS NOT NULL",
            [],
        ).map_err(|e| Error::database(format!("Failed to release claims: {}", e)))?;

        Ok(released)
    }

    /// All PENDING jobs, oldest first
    pub fn pending_jobs(&self) -> Result<Vec<JobRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM analysis_jobs WHERE status = 'PENDING' ORDER BY created_at ASC",
            JOB_COLUMNS
        )).map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let records = stmt.query_map([], row_to_job_record)
            .map_err(|e| Error::database(format!("Failed to list pending jobs: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Most recent jobs, newest first
    pub fn recent_jobs(&self, limit: usize) -> Result<Vec<JobRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM analysis_jobs ORDER BY created_at DESC LIMIT ?1",
            JOB_COLUMNS
        )).map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let records = stmt.query_map(params![limit as i64], row_to_job_record)
            .map_err(|e| Error::database(format!("Failed to list jobs: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Job counts per status
    pub fn stats(&self) -> Result<JobStats> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT status, COUNT(*) FROM analysis_jobs GROUP BY status"
        ).map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut stats = JobStats::default();
        for row in rows {
            let (status, count) = row?;
            let count = count as usize;
            stats.total += count;
            match JobStatus::parse(&status) {
                Some(JobStatus::Pending) => stats.pending += count,
                Some(JobStatus::Completed) => stats.completed += count,
                Some(JobStatus::Failed) | None => stats.failed += count,
            }
        }

        Ok(stats)
    }
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

fn row_to_job_record(row: &rusqlite::Row) -> rusqlite::Result<JobRecord> {
    let id_str: String = row.get(0)?;
    let file_name: String = row.get(1)?;
    let query: String = row.get(2)?;
    let file_path: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let result_json: Option<String> = row.get(5)?;
    let error: Option<String> = row.get(6)?;
    let claimed_at_str: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;
    let completed_at_str: Option<String> = row.get(10)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(JobRecord {
        id,
        file_name,
        query,
        file_path: PathBuf::from(file_path),
        status: JobStatus::parse(&status_str).unwrap_or(JobStatus::Failed),
        result_json,
        error,
        claimed_at: claimed_at_str.as_deref().and_then(parse_time),
        created_at: parse_time(&created_at_str).unwrap_or_else(Utc::now),
        updated_at: parse_time(&updated_at_str).unwrap_or_else(Utc::now),
        completed_at: completed_at_str.as_deref().and_then(parse_time),
    })
}
