//! Background consumer persisting `load.price` jobs.

use super::{ChannelQueue, Job};
use crate::db::Repository;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct PriceLoader;

impl PriceLoader {
    /// Start the loader and return the queue feeding it.
    ///
    /// The task exits once every clone of the queue is dropped and the
    /// backlog is drained.
    pub fn spawn(repo: Arc<Repository>) -> (ChannelQueue, JoinHandle<()>) {
        let (queue, rx) = ChannelQueue::new();
        let handle = tokio::spawn(run_loop(repo, rx));
        (queue, handle)
    }
}

async fn run_loop(repo: Arc<Repository>, mut rx: mpsc::UnboundedReceiver<Job>) {
    let mut loaded = 0u64;
    while let Some(job) = rx.recv().await {
        match job {
            Job::LoadPrice(price) => match repo.upsert_price(&price).await {
                Ok(()) => {
                    loaded += 1;
                    debug!(
                        chain_id = price.chain_id,
                        token = %price.address,
                        block_number = price.block_number,
                        source = %price.price_source,
                        "price stored"
                    );
                }
                Err(e) => warn!(
                    chain_id = price.chain_id,
                    token = %price.address,
                    block_number = price.block_number,
                    error = %e,
                    "failed to store price"
                ),
            },
        }
    }
    info!(loaded, "price loader stopped");
}
