//! Work queue between request handlers and the background worker
//!
//! The queue carries only identifiers; the job store is the source of truth
//! for job state. Delivery is at-least-once: the worker must tolerate the
//! same job id arriving more than once.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::error::{Error, Result};

/// One unit of background work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub job_id: Uuid,
    pub query: String,
    pub file_path: PathBuf,
}

/// Producer side, used by submission
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Hand an item to the worker without waiting; a full queue is an error
    async fn enqueue(&self, item: WorkItem) -> Result<()>;

    /// Items accepted but not yet picked up
    fn depth(&self) -> usize;
}

/// Consumer side, owned by the worker
#[async_trait]
pub trait WorkSource: Send {
    /// Next item, or `None` once every producer is gone
    async fn dequeue(&mut self) -> Option<WorkItem>;
}

/// Build a bounded in-process queue
pub fn channel_queue(capacity: usize) -> (ChannelQueue, ChannelReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let depth = Arc::new(AtomicUsize::new(0));

    (
        ChannelQueue {
            sender,
            depth: depth.clone(),
        },
        ChannelReceiver { receiver, depth },
    )
}

/// Bounded mpsc sender
#[derive(Clone)]
pub struct ChannelQueue {
    sender: mpsc::Sender<WorkItem>,
    depth: Arc<AtomicUsize>,
}

impl ChannelQueue {
    /// Wait for capacity instead of failing; for background producers only
    pub async fn enqueue_waiting(&self, item: WorkItem) -> Result<()> {
        let job_id = item.job_id;
        self.depth.fetch_add(1, Ordering::SeqCst);

        if self.sender.send(item).await.is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::Queue(format!("Failed to queue job {}: worker stopped", job_id)));
        }

        Ok(())
    }
}

#[async_trait]
impl WorkQueue for ChannelQueue {
    async fn enqueue(&self, item: WorkItem) -> Result<()> {
        let job_id = item.job_id;
        self.depth.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self.sender.try_send(item) {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            let reason = match e {
                TrySendError::Full(_) => "queue is full",
                TrySendError::Closed(_) => "worker stopped",
            };
            return Err(Error::Queue(format!("Failed to queue job {}: {}", job_id, reason)));
        }

        tracing::debug!("Queued job {}", job_id);
        Ok(())
    }

    fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

/// Bounded mpsc receiver
pub struct ChannelReceiver {
    receiver: mpsc::Receiver<WorkItem>,
    depth: Arc<AtomicUsize>,
}

#[async_trait]
impl WorkSource for ChannelReceiver {
    async fn dequeue(&mut self) -> Option<WorkItem> {
        let item = self.receiver.recv().await?;
        self.depth.fetch_sub(1, Ordering::SeqCst);
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(query: &str) -> WorkItem {
        WorkItem {
            job_id: Uuid::new_v4(),
            query: query.to_string(),
            file_path: PathBuf::from("data/x.pdf"),
        }
    }

    #[tokio::test]
    async fn test_fifo_and_depth() {
        let (queue, mut source) = channel_queue(8);
        let first = item("first");
        let second = item("second");

        queue.enqueue(first.clone()).await.unwrap();
        queue.enqueue(second.clone()).await.unwrap();
        assert_eq!(queue.depth(), 2);

        assert_eq!(source.dequeue().await, Some(first));
        assert_eq!(queue.depth(), 1);
        assert_eq!(source.dequeue().await, Some(second));
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn test_enqueue_fails_without_consumer() {
        let (queue, source) = channel_queue(8);
        drop(source);

        let result = queue.enqueue(item("orphan")).await;
        assert!(matches!(result, Err(Error::Queue(_))));
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn test_full_queue_fails_without_waiting() {
        let (queue, mut source) = channel_queue(1);
        queue.enqueue(item("first")).await.unwrap();

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(500),
            queue.enqueue(item("second")),
        )
        .await
        .expect("enqueue must not wait for capacity");
        assert!(matches!(result, Err(Error::Queue(ref msg)) if msg.contains("full")));
        assert_eq!(queue.depth(), 1);

        source.dequeue().await.unwrap();
        queue.enqueue(item("third")).await.unwrap();
    }

    #[tokio::test]
    async fn test_enqueue_waiting_resumes_when_drained() {
        let (queue, mut source) = channel_queue(1);
        queue.enqueue(item("first")).await.unwrap();

        let waiting = tokio::spawn({
            let queue = queue.clone();
            async move { queue.enqueue_waiting(item("second")).await }
        });
        assert_eq!(source.dequeue().await.unwrap().query, "first");
        waiting.await.unwrap().unwrap();
        assert_eq!(source.dequeue().await.unwrap().query, "second");
    }

    #[tokio::test]
    async fn test_source_ends_when_producers_dropped() {
        let (queue, mut source) = channel_queue(1);
        drop(queue);
        assert!(source.dequeue().await.is_none());
    }
}
