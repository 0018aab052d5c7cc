//! Price resolution: walk the cascade, persist new hits, fall back to `na`.

use super::cascade::{Cascade, Phase};
use crate::cache::TtlCache;
use crate::chain::ChainClient;
use crate::domain::{lower_hex, Address, BlockNumber, ChainId, Price};
use crate::queue::{Job, JobQueue};
use crate::sources::PriceQuery;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounds repeated lookups of the same token and block.
const RESOLUTION_TTL: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct PriceEngine {
    chain: Arc<dyn ChainClient>,
    queue: Arc<dyn JobQueue>,
    cascade: Cascade,
    resolved: TtlCache<Price>,
}

impl PriceEngine {
    pub fn new(chain: Arc<dyn ChainClient>, queue: Arc<dyn JobQueue>, cascade: Cascade) -> Self {
        Self {
            chain,
            queue,
            cascade,
            resolved: TtlCache::new(),
        }
    }

    /// USD price of `token` at `block_number`, or at the head when omitted.
    ///
    /// Never fails: when no provider knows the token the result is a
    /// zero-priced `na` record.
    pub async fn resolve_price(
        &self,
        chain_id: ChainId,
        token: Address,
        block_number: Option<BlockNumber>,
        latest: bool,
    ) -> Price {
        let (block_number, latest) = match block_number {
            Some(block_number) => (block_number, latest),
            None => match self.chain.block_number(chain_id).await {
                Ok(head) => (head, true),
                Err(e) => {
                    warn!(chain_id, %token, error = %e, "cannot resolve head block");
                    return Price::na(chain_id, token, 0, DateTime::<Utc>::default());
                }
            },
        };

        let key = format!("{}:{}:{}", chain_id, lower_hex(&token), block_number);
        self.resolved
            .wrap(&key, RESOLUTION_TTL, || {
                self.run_cascade(chain_id, token, block_number, latest)
            })
            .await
    }

    async fn run_cascade(
        &self,
        chain_id: ChainId,
        token: Address,
        block_number: BlockNumber,
        latest: bool,
    ) -> Price {
        if latest {
            let query = PriceQuery {
                chain_id,
                token,
                block_number,
                latest: true,
            };
            if let Some(price) = self.first_hit(Phase::Latest, &query).await {
                return price;
            }
        }

        let query = PriceQuery {
            chain_id,
            token,
            block_number,
            latest: false,
        };
        if let Some(price) = self.first_hit(Phase::Historical, &query).await {
            return price;
        }

        warn!(chain_id, %token, block_number, "no price");
        match self.chain.block_time(chain_id, block_number).await {
            Ok(block_time) => {
                let na = Price::na(chain_id, token, block_number, block_time);
                self.persist(&na).await;
                na
            }
            Err(e) => {
                warn!(chain_id, block_number, error = %e, "block time unavailable, na not stored");
                Price::na(chain_id, token, block_number, DateTime::<Utc>::default())
            }
        }
    }

    async fn first_hit(&self, phase: Phase, query: &PriceQuery) -> Option<Price> {
        for step in self.cascade.phase(phase) {
            let source = step.provider.name();
            match step.provider.fetch(query).await {
                Ok(Some(price)) => {
                    debug!(
                        chain_id = query.chain_id,
                        token = %query.token,
                        block_number = price.block_number,
                        source,
                        price_usd = %price.price_usd,
                        "price hit"
                    );
                    if step.provider.persists() {
                        self.persist(&price).await;
                    }
                    return Some(price);
                }
                Ok(None) => {
                    debug!(chain_id = query.chain_id, token = %query.token, source, "price miss");
                }
                Err(e) => {
                    warn!(
                        chain_id = query.chain_id,
                        token = %query.token,
                        block_number = query.block_number,
                        source,
                        error = %e,
                        "price source failed"
                    );
                }
            }
        }
        None
    }

    async fn persist(&self, price: &Price) {
        if let Err(e) = self.queue.enqueue(Job::LoadPrice(price.clone())).await {
            warn!(chain_id = price.chain_id, token = %price.address, error = %e, "enqueue failed");
        }
    }
}
