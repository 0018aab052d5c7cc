//! yPrice fallback microservice, signed requests.

use super::http::{decimal_from_json, HttpClient};
use super::{PriceProvider, PriceQuery, SourceError};
use crate::chain::ChainClient;
use crate::config::YPriceCredentials;
use crate::domain::{Price, PriceSource};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct YPriceSource {
    credentials: YPriceCredentials,
    http: HttpClient,
    chain: Arc<dyn ChainClient>,
}

impl YPriceSource {
    pub fn new(credentials: YPriceCredentials, http: HttpClient, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            credentials,
            http,
            chain,
        }
    }
}

#[async_trait]
impl PriceProvider for YPriceSource {
    fn name(&self) -> &'static str {
        "yprice"
    }

    async fn fetch(&self, query: &PriceQuery) -> Result<Option<Price>, SourceError> {
        let url = format!(
            "{}/get_price/{}/{}?block={}",
            self.credentials.api.trim_end_matches('/'),
            query.chain_id,
            query.token,
            query.block_number
        );
        let body = self
            .http
            .get_json(
                &url,
                &[
                    ("X-Signature", self.credentials.signature.as_str()),
                    ("X-Signer", self.credentials.signer.as_str()),
                ],
            )
            .await?;

        let price_usd = decimal_from_json(&body)
            .ok_or_else(|| SourceError::Parse(format!("yprice: unexpected body {}", body)))?;
        if price_usd.is_zero() || price_usd.is_negative() {
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
            PriceSource::YPrice,
            query.block_number,
            block_time,
        )))
    }
}
