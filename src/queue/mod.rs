//! Outbound job queue: fire-and-forget persistence signals.

use crate::domain::Price;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;

pub mod loader;
pub mod mock;

pub use loader::PriceLoader;
pub use mock::RecordingQueue;

/// Work handed to background consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Persist a freshly resolved price.
    LoadPrice(Price),
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Job::LoadPrice(_) => "load.price",
        }
    }
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue closed")]
    Closed,
}

/// Enqueue never waits for the job to be processed.
#[async_trait]
pub trait JobQueue: Send + Sync + fmt::Debug {
    async fn enqueue(&self, job: Job) -> Result<(), QueueError>;
}

/// In-process queue backed by an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl ChannelQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Job>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl JobQueue for ChannelQueue {
    async fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        self.tx.send(job).map_err(|_| QueueError::Closed)
    }
}
