//! On-chain lens oracle quoting tokens in USDC.

use super::{PriceProvider, PriceQuery, SourceError};
use crate::chain::{contracts, ChainClient};
use crate::config::PriceConfig;
use crate::domain::{scale_down, Price, PriceSource};
use async_trait::async_trait;
use std::sync::Arc;

const USDC_DECIMALS: u8 = 6;
const PRICE_DP: u32 = 4;

#[derive(Debug)]
pub struct LensSource {
    config: Arc<PriceConfig>,
    chain: Arc<dyn ChainClient>,
}

impl LensSource {
    pub fn new(config: Arc<PriceConfig>, chain: Arc<dyn ChainClient>) -> Self {
        Self { config, chain }
    }
}

#[async_trait]
impl PriceProvider for LensSource {
    fn name(&self) -> &'static str {
        "lens"
    }

    async fn fetch(&self, query: &PriceQuery) -> Result<Option<Price>, SourceError> {
        let Some(lens) = self.config.lens(query.chain_id) else {
            return Ok(None);
        };

        let raw = contracts::price_usdc_recommended(
            self.chain.as_ref(),
            query.chain_id,
            query.block_number,
            lens,
            query.token,
        )
        .await?;

        let price_usd = scale_down(raw, USDC_DECIMALS)?.truncate_dp(PRICE_DP);
        if price_usd.is_zero() {
            return Ok(None);
        }

        let block_time = self
            .chain
            .block_time(query.chain_id, query.block_number)
            .await?;
        Ok(Some(Price::new(
            query.chain_id,
            query.token,
            price_usd,
            PriceSource::Lens,
            query.block_number,
            block_time,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::contracts::ILensOracle;
    use crate::chain::MockChainClient;
    use crate::domain::{Address, Decimal};
    use alloy_primitives::U256;
    use alloy_sol_types::SolCall;

    fn lens() -> Address {
        Address::repeat_byte(0x1e)
    }

    fn token() -> Address {
        Address::repeat_byte(0x70)
    }

    fn source_with(raw: u64) -> (Arc<MockChainClient>, LensSource) {
        let input = ILensOracle::getPriceUsdcRecommendedCall {
            tokenAddress: token(),
        }
        .abi_encode();
        let chain = Arc::new(MockChainClient::new().with_word_at(
            1,
            500,
            lens(),
            input,
            U256::from(raw),
        ));
        let config = Arc::new(PriceConfig::empty().with_lens(1, lens()));
        (chain.clone(), LensSource::new(config, chain))
    }

    fn query(chain_id: u64) -> PriceQuery {
        PriceQuery {
            chain_id,
            token: token(),
            block_number: 500,
            latest: false,
        }
    }

    #[tokio::test]
    async fn test_usdc_quote_truncated_to_four_places() {
        let (_, source) = source_with(1_234_567);
        let price = source.fetch(&query(1)).await.unwrap().unwrap();
        assert_eq!(price.price_usd, Decimal::from_str_canonical("1.2345").unwrap());
        assert_eq!(price.price_source, PriceSource::Lens);
        assert_eq!(price.block_number, 500);
    }

    #[tokio::test]
    async fn test_zero_quote_is_a_miss() {
        let (_, source) = source_with(0);
        assert!(source.fetch(&query(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dust_quote_is_a_miss() {
        let (_, source) = source_with(50);
        assert!(source.fetch(&query(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chain_without_lens_never_calls() {
        let (chain, source) = source_with(1_000_000);
        assert!(source.fetch(&query(137)).await.unwrap().is_none());
        assert_eq!(chain.call_count(), 0);
    }
}
