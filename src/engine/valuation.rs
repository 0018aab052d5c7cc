//! USD valuation of token transfers, with vault shares priced through their asset.

use super::resolver::PriceEngine;
use crate::cache::TtlCache;
use crate::chain::{contracts, ChainClient};
use crate::db::VaultRegistry;
use crate::domain::{
    lower_hex, scale_down, value_usd, Address, BlockNumber, ChainId, Decimal, PriceSource,
    TransferEvent, Valuation, VaultRegistration, VAULT_LABEL,
};
use alloy_primitives::U256;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DECIMALS_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug)]
pub struct TransferValuer {
    engine: Arc<PriceEngine>,
    chain: Arc<dyn ChainClient>,
    registry: Arc<dyn VaultRegistry>,
    decimals: TtlCache<u8>,
}

impl TransferValuer {
    pub fn new(
        engine: Arc<PriceEngine>,
        chain: Arc<dyn ChainClient>,
        registry: Arc<dyn VaultRegistry>,
    ) -> Self {
        Self {
            engine,
            chain,
            registry,
            decimals: TtlCache::new(),
        }
    }

    pub async fn value_event(&self, event: &TransferEvent) -> Valuation {
        self.value_transfer(event.chain_id, event.address, event.block_number, event.value)
            .await
    }

    /// Value `raw_amount` units of `token` at `block_number`.
    ///
    /// Registered vaults are priced as `pricePerShare * asset price` and tagged
    /// `computed-<asset source>`. Anything else is priced directly.
    pub async fn value_transfer(
        &self,
        chain_id: ChainId,
        token: Address,
        block_number: BlockNumber,
        raw_amount: U256,
    ) -> Valuation {
        match self.registry.find_thing(chain_id, &token, VAULT_LABEL).await {
            Ok(Some(vault)) => self.value_vault_shares(&vault, block_number, raw_amount).await,
            Ok(None) => self.value_token(chain_id, token, block_number, raw_amount).await,
            Err(e) => {
                warn!(chain_id, %token, error = %e, "vault registry lookup failed");
                self.value_token(chain_id, token, block_number, raw_amount).await
            }
        }
    }

    async fn value_vault_shares(
        &self,
        vault: &VaultRegistration,
        block_number: BlockNumber,
        raw_amount: U256,
    ) -> Valuation {
        let chain_id = vault.chain_id;
        let decimals = vault.defaults.decimals;

        let price_per_share = match contracts::price_per_share(
            self.chain.as_ref(),
            chain_id,
            block_number,
            vault.address,
        )
        .await
        {
            Ok(raw) => match scale_down(raw, decimals) {
                Ok(pps) => pps,
                Err(e) => {
                    warn!(chain_id, vault = %vault.address, error = %e, "pricePerShare out of range");
                    return unpriced();
                }
            },
            Err(e) => {
                warn!(chain_id, vault = %vault.address, block_number, error = %e, "pricePerShare read failed");
                return unpriced();
            }
        };

        let asset = self
            .engine
            .resolve_price(chain_id, vault.defaults.asset, Some(block_number), false)
            .await;
        let price_usd = price_per_share
            .checked_mul(asset.price_usd)
            .unwrap_or_else(|| {
                warn!(chain_id, vault = %vault.address, "share price overflow");
                Decimal::zero()
            });
        debug!(
            chain_id,
            vault = %vault.address,
            %price_per_share,
            asset_price = %asset.price_usd,
            "vault share priced"
        );

        Valuation {
            value_usd: self.amount_usd(chain_id, &vault.address, raw_amount, decimals, price_usd),
            price_usd,
            price_source: PriceSource::computed(asset.price_source),
        }
    }

    async fn value_token(
        &self,
        chain_id: ChainId,
        token: Address,
        block_number: BlockNumber,
        raw_amount: U256,
    ) -> Valuation {
        let key = format!("{}:{}", chain_id, lower_hex(&token));
        let decimals = self
            .decimals
            .try_wrap(&key, DECIMALS_TTL, || {
                contracts::erc20_decimals(self.chain.as_ref(), chain_id, token)
            })
            .await;
        let price = self
            .engine
            .resolve_price(chain_id, token, Some(block_number), false)
            .await;

        let value_usd = match decimals {
            Ok(decimals) => self.amount_usd(chain_id, &token, raw_amount, decimals, price.price_usd),
            Err(e) => {
                warn!(chain_id, %token, error = %e, "token decimals unavailable");
                Decimal::zero()
            }
        };
        Valuation {
            value_usd,
            price_usd: price.price_usd,
            price_source: price.price_source,
        }
    }

    fn amount_usd(
        &self,
        chain_id: ChainId,
        token: &Address,
        raw_amount: U256,
        decimals: u8,
        price_usd: Decimal,
    ) -> Decimal {
        value_usd(raw_amount, decimals, price_usd).unwrap_or_else(|e| {
            warn!(chain_id, %token, error = %e, "transfer value out of range");
            Decimal::zero()
        })
    }
}

fn unpriced() -> Valuation {
    Valuation {
        value_usd: Decimal::zero(),
        price_usd: Decimal::zero(),
        price_source: PriceSource::Na,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::contracts::{IERC20Metadata, IVault};
    use crate::chain::MockChainClient;
    use crate::engine::Cascade;
    use crate::queue::RecordingQueue;
    use crate::sources::MockSource;
    use alloy_sol_types::SolCall;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct BrokenRegistry;

    #[async_trait]
    impl VaultRegistry for BrokenRegistry {
        async fn find_thing(
            &self,
            _chain_id: ChainId,
            _address: &Address,
            _label: &str,
        ) -> Result<Option<VaultRegistration>, sqlx::Error> {
            Err(sqlx::Error::PoolClosed)
        }
    }

    #[derive(Debug)]
    struct OneVault(VaultRegistration);

    #[async_trait]
    impl VaultRegistry for OneVault {
        async fn find_thing(
            &self,
            chain_id: ChainId,
            address: &Address,
            label: &str,
        ) -> Result<Option<VaultRegistration>, sqlx::Error> {
            let v = &self.0;
            Ok((v.chain_id == chain_id && &v.address == address && v.label == label)
                .then(|| v.clone()))
        }
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn valuer(chain: MockChainClient, registry: Arc<dyn VaultRegistry>) -> TransferValuer {
        let chain: Arc<dyn ChainClient> = Arc::new(chain);
        let cascade = Cascade::new().historical(Arc::new(MockSource::hit(
            "flat",
            d("2"),
            PriceSource::Lens,
        )));
        let engine = Arc::new(PriceEngine::new(
            chain.clone(),
            Arc::new(RecordingQueue::new()),
            cascade,
        ));
        TransferValuer::new(engine, chain, registry)
    }

    #[tokio::test]
    async fn test_registry_failure_falls_back_to_token_pricing() {
        let token = Address::repeat_byte(0x10);
        let chain = MockChainClient::new().with_word(
            1,
            token,
            IERC20Metadata::decimalsCall {}.abi_encode(),
            U256::from(6u8),
        );
        let valuer = valuer(chain, Arc::new(BrokenRegistry));

        let valuation = valuer
            .value_transfer(1, token, 5, U256::from(3_000_000u64))
            .await;
        assert_eq!(valuation.value_usd, d("6"));
        assert_eq!(valuation.price_source, PriceSource::Lens);
    }

    #[tokio::test]
    async fn test_unreadable_price_per_share_is_unpriced() {
        let vault = VaultRegistration::new(
            1,
            Address::repeat_byte(0x20),
            crate::domain::VaultDefaults {
                decimals: 18,
                asset: Address::repeat_byte(0x21),
            },
        );
        let valuer = valuer(MockChainClient::new(), Arc::new(OneVault(vault.clone())));

        let valuation = valuer
            .value_transfer(1, vault.address, 5, U256::from(1u8))
            .await;
        assert_eq!(valuation.value_usd, Decimal::zero());
        assert_eq!(valuation.price_source, PriceSource::Na);
    }

    #[tokio::test]
    async fn test_missing_decimals_keeps_price() {
        let token = Address::repeat_byte(0x30);
        let valuer = valuer(MockChainClient::new(), Arc::new(BrokenRegistry));

        let valuation = valuer.value_transfer(1, token, 5, U256::from(1u8)).await;
        assert_eq!(valuation.value_usd, Decimal::zero());
        assert_eq!(valuation.price_usd, d("2"));
    }

    #[tokio::test]
    async fn test_value_event_prices_vault_through_asset() {
        let vault = VaultRegistration::new(
            1,
            Address::repeat_byte(0x40),
            crate::domain::VaultDefaults {
                decimals: 6,
                asset: Address::repeat_byte(0x41),
            },
        );
        let chain = MockChainClient::new().with_word_at(
            1,
            8,
            vault.address,
            IVault::pricePerShareCall {}.abi_encode(),
            U256::from(1_100_000u64),
        );
        let valuer = valuer(chain, Arc::new(OneVault(vault.clone())));

        let event = TransferEvent {
            chain_id: 1,
            address: vault.address,
            block_number: 8,
            value: U256::from(10_000_000u64),
        };
        let valuation = valuer.value_event(&event).await;
        assert_eq!(valuation.price_usd, d("2.2"));
        assert_eq!(valuation.value_usd, d("22"));
        assert_eq!(valuation.price_source.to_string(), "computed-lens");
    }
}
