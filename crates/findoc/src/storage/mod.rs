//! Storage module for persistent data
//!
//! SQLite-backed job store and the upload directory.

mod database;
mod uploads;

pub use database::{ClaimOutcome, JobStore};
pub use uploads::{UploadStore, UPLOAD_EXTENSION};
