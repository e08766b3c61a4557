//! findoc: asynchronous financial document analysis service
//!
//! Clients upload a document with a query and receive a job id at once. A
//! background worker extracts the text, truncates it to a fixed character
//! budget, asks an LLM for a structured investment analysis and stores the
//! validated result. Clients poll for the outcome.

pub mod analysis;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod server;
pub mod service;
pub mod storage;
pub mod types;

pub use config::AnalyzerConfig;
pub use error::{Error, Result};
pub use types::{AnalysisResult, JobRecord, JobStatus, StatusResponse, SubmitResponse};
