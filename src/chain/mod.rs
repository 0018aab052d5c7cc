//! Chain access: block height, block time and view calls pinned to a block.

use crate::domain::{Address, BlockNumber, ChainId};
use alloy_primitives::Bytes;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod contracts;
pub mod mock;
pub mod rpc;

pub use mock::MockChainClient;
pub use rpc::RpcChainClient;

/// Read-only view of EVM chains.
///
/// Implementations apply their own per-call timeout.
#[async_trait]
pub trait ChainClient: Send + Sync + std::fmt::Debug {
    /// Current head block of `chain_id`.
    async fn block_number(&self, chain_id: ChainId) -> Result<BlockNumber, ChainError>;

    /// Timestamp of `block_number` on `chain_id`.
    async fn block_time(
        &self,
        chain_id: ChainId,
        block_number: BlockNumber,
    ) -> Result<DateTime<Utc>, ChainError>;

    /// `eth_call` of `input` against `to`, at `block_number` or at the head when `None`.
    async fn call(
        &self,
        chain_id: ChainId,
        block_number: Option<BlockNumber>,
        to: Address,
        input: Bytes,
    ) -> Result<Bytes, ChainError>;
}

#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("no rpc configured for chain {0}")]
    UnknownChain(ChainId),
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("rpc timed out after {0}ms")]
    Timeout(u64),
    #[error("block {1} not found on chain {0}")]
    BlockNotFound(ChainId, BlockNumber),
    #[error("abi decode error: {0}")]
    Decode(String),
}
