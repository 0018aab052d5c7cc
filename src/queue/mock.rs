//! Queue double that records jobs instead of delivering them.

use super::{Job, JobQueue, QueueError};
use crate::domain::Price;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Clones share the recorded jobs.
#[derive(Debug, Clone, Default)]
pub struct RecordingQueue {
    jobs: Arc<Mutex<Vec<Job>>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().map(|j| j.clone()).unwrap_or_default()
    }

    /// Prices carried by `load.price` jobs, in enqueue order.
    pub fn prices(&self) -> Vec<Price> {
        self.jobs()
            .into_iter()
            .map(|job| match job {
                Job::LoadPrice(price) => price,
            })
            .collect()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.push(job);
        }
        Ok(())
    }
}
