//! Mock chain client for testing without an RPC node.

use super::{ChainClient, ChainError};
use crate::domain::{Address, BlockNumber, ChainId};
use alloy_primitives::{Bytes, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Timestamp of block 0 in the synthetic block-time schedule.
const GENESIS_TIME: i64 = 1_600_000_000;
const BLOCK_SECONDS: i64 = 12;

type CallKey = (ChainId, Address, Bytes);

/// Mock chain that answers view calls from canned 32-byte words.
///
/// Block times follow a fixed 12-second schedule unless overridden.
#[derive(Debug, Default)]
pub struct MockChainClient {
    heads: HashMap<ChainId, BlockNumber>,
    block_times: HashMap<(ChainId, BlockNumber), DateTime<Utc>>,
    at_block: HashMap<(CallKey, BlockNumber), Bytes>,
    any_block: HashMap<CallKey, Bytes>,
    calls: Mutex<Vec<(ChainId, Option<BlockNumber>, Address)>>,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the head block reported for `chain_id`.
    pub fn with_head(mut self, chain_id: ChainId, block_number: BlockNumber) -> Self {
        self.heads.insert(chain_id, block_number);
        self
    }

    pub fn with_block_time(
        mut self,
        chain_id: ChainId,
        block_number: BlockNumber,
        time: DateTime<Utc>,
    ) -> Self {
        self.block_times.insert((chain_id, block_number), time);
        self
    }

    /// Answer `input` sent to `to` with `value`, at any block.
    pub fn with_word(
        mut self,
        chain_id: ChainId,
        to: Address,
        input: impl Into<Bytes>,
        value: U256,
    ) -> Self {
        self.any_block
            .insert((chain_id, to, input.into()), word(value));
        self
    }

    /// Answer `input` sent to `to` with `value`, only at `block_number`.
    pub fn with_word_at(
        mut self,
        chain_id: ChainId,
        block_number: BlockNumber,
        to: Address,
        input: impl Into<Bytes>,
        value: U256,
    ) -> Self {
        self.at_block
            .insert(((chain_id, to, input.into()), block_number), word(value));
        self
    }

    /// Number of view calls sent to `to`.
    pub fn calls_to(&self, to: &Address) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|(_, _, a)| a == to).count())
            .unwrap_or(0)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    fn head(&self, chain_id: ChainId) -> Result<BlockNumber, ChainError> {
        self.heads
            .get(&chain_id)
            .copied()
            .ok_or(ChainError::UnknownChain(chain_id))
    }
}

fn word(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

/// Synthetic timestamp of `block_number` in the default schedule.
pub fn synthetic_block_time(block_number: BlockNumber) -> DateTime<Utc> {
    DateTime::from_timestamp(GENESIS_TIME + block_number as i64 * BLOCK_SECONDS, 0)
        .unwrap_or_default()
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn block_number(&self, chain_id: ChainId) -> Result<BlockNumber, ChainError> {
        self.head(chain_id)
    }

    async fn block_time(
        &self,
        chain_id: ChainId,
        block_number: BlockNumber,
    ) -> Result<DateTime<Utc>, ChainError> {
        Ok(self
            .block_times
            .get(&(chain_id, block_number))
            .copied()
            .unwrap_or_else(|| synthetic_block_time(block_number)))
    }

    async fn call(
        &self,
        chain_id: ChainId,
        block_number: Option<BlockNumber>,
        to: Address,
        input: Bytes,
    ) -> Result<Bytes, ChainError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((chain_id, block_number, to));
        }

        let block = match block_number {
            Some(b) => b,
            None => self.head(chain_id).unwrap_or_default(),
        };
        let key = (chain_id, to, input);
        if let Some(out) = self.at_block.get(&(key.clone(), block)) {
            return Ok(out.clone());
        }
        self.any_block
            .get(&key)
            .cloned()
            .ok_or_else(|| ChainError::Rpc(format!("execution reverted: no mock for {}", to)))
    }
}
