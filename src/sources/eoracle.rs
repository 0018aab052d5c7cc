//! eOracle feed contracts, configured per chain and token.

use super::{PriceProvider, PriceQuery, SourceError};
use crate::cache::TtlCache;
use crate::chain::{contracts, ChainClient};
use crate::config::PriceConfig;
use crate::domain::{lower_hex, scale_down, Price, PriceSource};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Feed decimals are fixed at deployment.
const DECIMALS_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug)]
pub struct EOracleSource {
    config: Arc<PriceConfig>,
    chain: Arc<dyn ChainClient>,
    decimals: TtlCache<u8>,
}

impl EOracleSource {
    pub fn new(config: Arc<PriceConfig>, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            config,
            chain,
            decimals: TtlCache::new(),
        }
    }
}

#[async_trait]
impl PriceProvider for EOracleSource {
    fn name(&self) -> &'static str {
        "eoracle"
    }

    async fn fetch(&self, query: &PriceQuery) -> Result<Option<Price>, SourceError> {
        let Some(feed) = self.config.eoracle_feed(query.chain_id, &query.token) else {
            return Ok(None);
        };
        let chain_id = query.chain_id;

        let key = format!("{}:{}", chain_id, lower_hex(&feed));
        let decimals = self
            .decimals
            .try_wrap(&key, DECIMALS_TTL, || {
                contracts::feed_decimals(self.chain.as_ref(), chain_id, feed)
            })
            .await?;

        // A latest request reads the feed at the current head, not the requested block.
        let block_number = if query.latest {
            self.chain.block_number(chain_id).await?
        } else {
            query.block_number
        };

        let answer =
            contracts::latest_answer(self.chain.as_ref(), chain_id, block_number, feed).await?;
        debug!(chain_id, token = %query.token, block_number, %answer, "eOracle answer");
        if answer.is_zero() {
            return Ok(None);
        }

        let price_usd = scale_down(answer, decimals)?;
        let block_time = self.chain.block_time(chain_id, block_number).await?;
        Ok(Some(Price::new(
            chain_id,
            query.token,
            price_usd,
            PriceSource::EOracle,
            block_number,
            block_time,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::contracts::IPriceFeed;
    use crate::chain::MockChainClient;
    use crate::domain::{Address, Decimal};
    use alloy_primitives::U256;
    use alloy_sol_types::SolCall;

    fn token() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn feed() -> Address {
        Address::repeat_byte(0xfe)
    }

    fn config() -> Arc<PriceConfig> {
        Arc::new(PriceConfig::empty().with_eoracle_feed(1, token(), feed()))
    }

    fn chain_with_answer(block: u64, answer: u64) -> MockChainClient {
        MockChainClient::new()
            .with_head(1, 200)
            .with_word(1, feed(), IPriceFeed::decimalsCall {}.abi_encode(), U256::from(8u8))
            .with_word_at(
                1,
                block,
                feed(),
                IPriceFeed::latestAnswerCall {}.abi_encode(),
                U256::from(answer),
            )
    }

    fn query(block_number: u64, latest: bool) -> PriceQuery {
        PriceQuery {
            chain_id: 1,
            token: token(),
            block_number,
            latest,
        }
    }

    #[tokio::test]
    async fn test_historical_read_scales_by_feed_decimals() {
        let chain = Arc::new(chain_with_answer(100, 250_000_000_000));
        let source = EOracleSource::new(config(), chain);

        let price = source.fetch(&query(100, false)).await.unwrap().unwrap();
        assert_eq!(price.price_usd, Decimal::from_str_canonical("2500").unwrap());
        assert_eq!(price.price_source, PriceSource::EOracle);
        assert_eq!(price.block_number, 100);
    }

    #[tokio::test]
    async fn test_latest_reads_at_head() {
        let chain = Arc::new(chain_with_answer(200, 100_000_000));
        let source = EOracleSource::new(config(), chain);

        let price = source.fetch(&query(150, true)).await.unwrap().unwrap();
        assert_eq!(price.block_number, 200);
        assert_eq!(price.price_usd, Decimal::from_str_canonical("1").unwrap());
    }

    #[tokio::test]
    async fn test_zero_answer_is_a_miss() {
        let chain = Arc::new(chain_with_answer(100, 0));
        let source = EOracleSource::new(config(), chain);
        assert!(source.fetch(&query(100, false)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_token_is_a_miss_without_rpc() {
        let chain = Arc::new(MockChainClient::new());
        let source = EOracleSource::new(Arc::new(PriceConfig::empty()), chain.clone());
        assert!(source.fetch(&query(100, false)).await.unwrap().is_none());
        assert_eq!(chain.call_count(), 0);
    }

    #[tokio::test]
    async fn test_decimals_read_once() {
        let chain = Arc::new(
            chain_with_answer(100, 100_000_000).with_word_at(
                1,
                101,
                feed(),
                IPriceFeed::latestAnswerCall {}.abi_encode(),
                U256::from(100_000_000u64),
            ),
        );
        let source = EOracleSource::new(config(), chain.clone());

        source.fetch(&query(100, false)).await.unwrap();
        source.fetch(&query(101, false)).await.unwrap();
        // two answers plus a single decimals read
        assert_eq!(chain.calls_to(&feed()), 3);
    }

    #[tokio::test]
    async fn test_rpc_failure_is_an_error() {
        let chain = Arc::new(MockChainClient::new().with_head(1, 200));
        let source = EOracleSource::new(config(), chain);
        assert!(source.fetch(&query(100, false)).await.is_err());
    }
}
