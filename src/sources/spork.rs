//! Spork pricing API with per-asset mappings and static default prices.
//!
//! Quotes are cached per `(chain, token)` for 60 seconds regardless of block.
//! A cached quote is re-stamped with the requested block, so within that
//! window a Spork price is an approximation rather than an exact-block value.

use super::http::HttpClient;
use super::{PriceProvider, PriceQuery, SourceError};
use crate::cache::TtlCache;
use crate::chain::ChainClient;
use crate::config::{PriceConfig, SporkAsset, SporkCredentials};
use crate::domain::{lower_hex, scale_down, Decimal, Price, PriceSource};
use alloy_primitives::U256;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const QUOTE_TTL: Duration = Duration::from_secs(60);
const QUOTE_DECIMALS: u8 = 18;

#[derive(Debug)]
pub struct SporkSource {
    credentials: SporkCredentials,
    config: Arc<PriceConfig>,
    http: HttpClient,
    chain: Arc<dyn ChainClient>,
    quotes: TtlCache<Decimal>,
}

impl SporkSource {
    pub fn new(
        credentials: SporkCredentials,
        config: Arc<PriceConfig>,
        http: HttpClient,
        chain: Arc<dyn ChainClient>,
    ) -> Self {
        Self {
            credentials,
            config,
            http,
            chain,
            quotes: TtlCache::new(),
        }
    }

    /// Raw 18-decimal quote for `asset`, falling back to its default price.
    async fn quote(&self, asset: &SporkAsset) -> Result<Option<U256>, SourceError> {
        if asset.asset_id.is_empty() {
            return Ok(asset.default_price);
        }

        let url = format!(
            "{}/v1/prices/latest?assets={}",
            self.credentials.api.trim_end_matches('/'),
            asset.asset_id
        );
        let body = match self
            .http
            .get_json(&url, &[("Authorization", self.credentials.auth.as_str())])
            .await
        {
            Ok(body) => body,
            Err(SourceError::Http { status: 404, .. }) if asset.default_price.is_some() => {
                debug!(asset_id = %asset.asset_id, "spork 404, using default price");
                return Ok(asset.default_price);
            }
            Err(e) => return Err(e),
        };

        match &body["data"][asset.asset_id.as_str()]["price"] {
            serde_json::Value::Null => Ok(None),
            value => parse_quote(value).map(Some),
        }
    }
}

fn parse_quote(value: &serde_json::Value) -> Result<U256, SourceError> {
    let bad = || SourceError::Parse(format!("spork: unexpected price {}", value));
    match value {
        serde_json::Value::String(s) => U256::from_str_radix(s.trim(), 10).map_err(|_| bad()),
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return Ok(U256::from(v));
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < 1e38 => {
                    Ok(U256::from(f as u128))
                }
                _ => Err(bad()),
            }
        }
        _ => Err(bad()),
    }
}

#[async_trait]
impl PriceProvider for SporkSource {
    fn name(&self) -> &'static str {
        "spork"
    }

    async fn fetch(&self, query: &PriceQuery) -> Result<Option<Price>, SourceError> {
        let Some(asset) = self.config.spork_asset(query.chain_id, &query.token) else {
            return Ok(None);
        };

        let key = format!("{}:{}", query.chain_id, lower_hex(&query.token));
        let price_usd = match self.quotes.get(&key) {
            Some(price_usd) => price_usd,
            None => {
                let Some(raw) = self.quote(asset).await? else {
                    return Ok(None);
                };
                if raw.is_zero() {
                    return Ok(None);
                }
                let price_usd = scale_down(raw, QUOTE_DECIMALS)?;
                self.quotes.insert(key, price_usd, QUOTE_TTL);
                price_usd
            }
        };

        let block_time = self
            .chain
            .block_time(query.chain_id, query.block_number)
            .await?;
        Ok(Some(Price::new(
            query.chain_id,
            query.token,
            price_usd,
            PriceSource::Spork,
            query.block_number,
            block_time,
        )))
    }
}
