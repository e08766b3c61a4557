//! Core types for the analysis service

pub mod analysis;
pub mod job;
pub mod response;

pub use analysis::{AnalysisResult, FinancialMetric, InvestmentRecommendation, RiskLevel};
pub use job::{JobRecord, JobStatus};
pub use response::{JobListResponse, JobStats, JobSummary, StatusResponse, SubmitResponse};
