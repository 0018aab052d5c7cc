//! Contract interfaces read by the price sources and typed call helpers.

use super::{ChainClient, ChainError};
use crate::domain::{Address, BlockNumber, ChainId};
use alloy_primitives::U256;
use alloy_sol_types::{sol, SolCall};

sol! {
    /// eOracle feed (Chainlink-compatible aggregator).
    #[allow(missing_docs)]
    interface IPriceFeed {
        function latestAnswer() external view returns (uint256);
        function decimals() external view returns (uint8);
    }

    /// Multi-venue price lens, quotes in USDC (6 decimals).
    #[allow(missing_docs)]
    interface ILensOracle {
        function getPriceUsdcRecommended(address tokenAddress) external view returns (uint256);
    }

    #[allow(missing_docs)]
    interface IVault {
        function pricePerShare() external view returns (uint256);
    }

    #[allow(missing_docs)]
    interface IERC20Metadata {
        function decimals() external view returns (uint8);
    }
}

/// Encode `call`, run it against `to` and decode the return value.
pub async fn read<C>(
    client: &dyn ChainClient,
    chain_id: ChainId,
    block_number: Option<BlockNumber>,
    to: Address,
    call: C,
) -> Result<C::Return, ChainError>
where
    C: SolCall + Send,
{
    let input = call.abi_encode();
    let output = client
        .call(chain_id, block_number, to, input.into())
        .await?;
    C::abi_decode_returns(&output).map_err(|e| ChainError::Decode(e.to_string()))
}

pub async fn latest_answer(
    client: &dyn ChainClient,
    chain_id: ChainId,
    block_number: BlockNumber,
    feed: Address,
) -> Result<U256, ChainError> {
    read(
        client,
        chain_id,
        Some(block_number),
        feed,
        IPriceFeed::latestAnswerCall {},
    )
    .await
}

pub async fn feed_decimals(
    client: &dyn ChainClient,
    chain_id: ChainId,
    feed: Address,
) -> Result<u8, ChainError> {
    read(client, chain_id, None, feed, IPriceFeed::decimalsCall {}).await
}

pub async fn price_usdc_recommended(
    client: &dyn ChainClient,
    chain_id: ChainId,
    block_number: BlockNumber,
    lens: Address,
    token: Address,
) -> Result<U256, ChainError> {
    read(
        client,
        chain_id,
        Some(block_number),
        lens,
        ILensOracle::getPriceUsdcRecommendedCall {
            tokenAddress: token,
        },
    )
    .await
}

pub async fn price_per_share(
    client: &dyn ChainClient,
    chain_id: ChainId,
    block_number: BlockNumber,
    vault: Address,
) -> Result<U256, ChainError> {
    read(
        client,
        chain_id,
        Some(block_number),
        vault,
        IVault::pricePerShareCall {},
    )
    .await
}

pub async fn erc20_decimals(
    client: &dyn ChainClient,
    chain_id: ChainId,
    token: Address,
) -> Result<u8, ChainError> {
    read(client, chain_id, None, token, IERC20Metadata::decimalsCall {}).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainClient;

    #[tokio::test]
    async fn test_read_decodes_uint256() {
        let feed = Address::repeat_byte(0x11);
        let chain = MockChainClient::new().with_word_at(
            1,
            100,
            feed,
            IPriceFeed::latestAnswerCall {}.abi_encode(),
            U256::from(123_456u64),
        );
        let answer = latest_answer(&chain, 1, 100, feed).await.unwrap();
        assert_eq!(answer, U256::from(123_456u64));
    }

    #[tokio::test]
    async fn test_read_decodes_uint8() {
        let token = Address::repeat_byte(0x22);
        let chain = MockChainClient::new().with_word(
            1,
            token,
            IERC20Metadata::decimalsCall {}.abi_encode(),
            U256::from(6u8),
        );
        assert_eq!(erc20_decimals(&chain, 1, token).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_read_surfaces_rpc_errors() {
        let chain = MockChainClient::new();
        let result = price_per_share(&chain, 1, 5, Address::repeat_byte(0x33)).await;
        assert!(matches!(result, Err(ChainError::Rpc(_))));
    }

    #[test]
    fn test_lens_calldata_carries_token() {
        let token = Address::repeat_byte(0x44);
        let input = ILensOracle::getPriceUsdcRecommendedCall {
            tokenAddress: token,
        }
        .abi_encode();
        assert_eq!(input.len(), 4 + 32);
        assert_eq!(&input[16..36], token.as_slice());
    }
}
