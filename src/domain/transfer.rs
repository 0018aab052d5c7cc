//! Transfer events and their USD valuation.

use crate::domain::{Address, BlockNumber, ChainId, Decimal, PriceSource};
use alloy_primitives::U256;
use serde::Serialize;

/// A decoded ERC-20 / vault share `Transfer` awaiting valuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub chain_id: ChainId,
    pub address: Address,
    pub block_number: BlockNumber,
    /// Raw transferred amount in token units.
    pub value: U256,
}

/// USD valuation attached to a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub value_usd: Decimal,
    pub price_usd: Decimal,
    pub price_source: PriceSource,
}
