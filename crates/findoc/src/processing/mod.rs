//! Background analysis processing

pub mod queue;
pub mod worker;

pub use queue::{channel_queue, ChannelQueue, ChannelReceiver, WorkItem, WorkQueue, WorkSource};
pub use worker::{truncate_chars, ActiveJobs, AnalysisWorker, JobOutcome, WorkerOptions};
