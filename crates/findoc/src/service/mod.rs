//! Request-side services: submission and status queries

pub mod status;
pub mod submission;

pub use status::{StatusService, DEFAULT_LIST_LIMIT};
pub use submission::SubmissionService;
