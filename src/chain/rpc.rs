//! JSON-RPC chain client over alloy HTTP providers, one per chain.

use super::{ChainClient, ChainError};
use crate::cache::TtlCache;
use crate::domain::{Address, BlockNumber, ChainId};
use alloy_primitives::Bytes;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::{BlockId, BlockNumberOrTag, TransactionRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::future::IntoFuture;
use std::time::Duration;
use tracing::{debug, info};

/// Block timestamps never change once mined.
const BLOCK_TIME_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct RpcChainClient {
    providers: HashMap<ChainId, DynProvider>,
    timeout: Duration,
    block_times: TtlCache<DateTime<Utc>>,
}

impl RpcChainClient {
    /// Build one HTTP provider per configured chain.
    ///
    /// # Errors
    /// Returns an error if any RPC URL is malformed.
    pub fn new(rpc_urls: &HashMap<ChainId, String>, timeout_ms: u64) -> Result<Self, ChainError> {
        let mut providers = HashMap::new();
        for (chain_id, raw_url) in rpc_urls {
            let url: reqwest::Url = raw_url
                .parse()
                .map_err(|e| ChainError::Rpc(format!("invalid rpc url for chain {}: {}", chain_id, e)))?;
            let provider = ProviderBuilder::new().connect_http(url).erased();
            providers.insert(*chain_id, provider);
            info!(chain_id, "RPC provider configured");
        }
        Ok(Self {
            providers,
            timeout: Duration::from_millis(timeout_ms),
            block_times: TtlCache::new(),
        })
    }

    fn provider(&self, chain_id: ChainId) -> Result<&DynProvider, ChainError> {
        self.providers
            .get(&chain_id)
            .ok_or(ChainError::UnknownChain(chain_id))
    }

    async fn timed<T, E, F>(&self, request: F) -> Result<T, ChainError>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: fmt::Display,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ChainError::Rpc(e.to_string())),
            Err(_) => Err(ChainError::Timeout(self.timeout.as_millis() as u64)),
        }
    }

    async fn fetch_block_time(
        &self,
        chain_id: ChainId,
        block_number: BlockNumber,
    ) -> Result<DateTime<Utc>, ChainError> {
        let provider = self.provider(chain_id)?;
        let block = self
            .timed(provider.get_block_by_number(BlockNumberOrTag::Number(block_number)))
            .await?
            .ok_or(ChainError::BlockNotFound(chain_id, block_number))?;
        DateTime::from_timestamp(block.header.timestamp as i64, 0)
            .ok_or_else(|| ChainError::Decode(format!("bad timestamp {}", block.header.timestamp)))
    }
}

impl fmt::Debug for RpcChainClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chains: Vec<_> = self.providers.keys().copied().collect();
        chains.sort_unstable();
        f.debug_struct("RpcChainClient")
            .field("chains", &chains)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn block_number(&self, chain_id: ChainId) -> Result<BlockNumber, ChainError> {
        let provider = self.provider(chain_id)?;
        self.timed(provider.get_block_number()).await
    }

    async fn block_time(
        &self,
        chain_id: ChainId,
        block_number: BlockNumber,
    ) -> Result<DateTime<Utc>, ChainError> {
        let key = format!("{}:{}", chain_id, block_number);
        self.block_times
            .try_wrap(&key, BLOCK_TIME_TTL, || {
                self.fetch_block_time(chain_id, block_number)
            })
            .await
    }

    async fn call(
        &self,
        chain_id: ChainId,
        block_number: Option<BlockNumber>,
        to: Address,
        input: Bytes,
    ) -> Result<Bytes, ChainError> {
        let provider = self.provider(chain_id)?;
        let block = block_number.map(BlockId::number).unwrap_or_else(BlockId::latest);
        debug!(chain_id, ?block_number, %to, "eth_call");

        let tx = TransactionRequest::default().to(to).input(input.into());
        self.timed(provider.call(tx).block(block)).await
    }
}
