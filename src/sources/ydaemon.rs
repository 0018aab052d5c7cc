//! yDaemon bulk price snapshot. Only consulted for latest requests.

use super::http::{decimal_from_json, HttpClient};
use super::{PriceProvider, PriceQuery, SourceError};
use crate::cache::TtlCache;
use crate::chain::ChainClient;
use crate::domain::{lower_hex, Decimal, Price, PriceSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const SNAPSHOT_TTL: Duration = Duration::from_secs(60);
const SNAPSHOT_KEY: &str = "ydaemon:prices:all";

/// chain id (decimal string) -> lower-case address -> quote.
type Snapshot = HashMap<String, HashMap<String, Option<Decimal>>>;

#[derive(Debug)]
pub struct YDaemonSource {
    api: String,
    http: HttpClient,
    chain: Arc<dyn ChainClient>,
    snapshot: TtlCache<Arc<Snapshot>>,
}

impl YDaemonSource {
    pub fn new(api: impl Into<String>, http: HttpClient, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            api: api.into().trim_end_matches('/').to_string(),
            http,
            chain,
            snapshot: TtlCache::new(),
        }
    }

    async fn fetch_snapshot(&self) -> Result<Arc<Snapshot>, SourceError> {
        let url = format!("{}/prices/all?humanized=true", self.api);
        let body = self.http.get_json(&url, &[]).await?;
        let serde_json::Value::Object(chains) = body else {
            return Err(SourceError::Parse("ydaemon: expected an object".to_string()));
        };

        let mut snapshot = Snapshot::with_capacity(chains.len());
        for (chain_id, tokens) in chains {
            let serde_json::Value::Object(tokens) = tokens else {
                continue;
            };
            let by_token = tokens
                .iter()
                .map(|(addr, quote)| (addr.to_lowercase(), decimal_from_json(quote)))
                .collect();
            snapshot.insert(chain_id, by_token);
        }
        debug!(chains = snapshot.len(), "ydaemon snapshot refreshed");
        Ok(Arc::new(snapshot))
    }
}

#[async_trait]
impl PriceProvider for YDaemonSource {
    fn name(&self) -> &'static str {
        "ydaemon"
    }

    async fn fetch(&self, query: &PriceQuery) -> Result<Option<Price>, SourceError> {
        // no historical dimension
        if !query.latest {
            return Ok(None);
        }

        let snapshot = self
            .snapshot
            .try_wrap(SNAPSHOT_KEY, SNAPSHOT_TTL, || self.fetch_snapshot())
            .await?;

        let quote = snapshot
            .get(&query.chain_id.to_string())
            .and_then(|tokens| tokens.get(&lower_hex(&query.token)))
            .copied()
            .flatten();
        let Some(price_usd) = quote.filter(|p| !p.is_zero() && !p.is_negative()) else {
            return Ok(None);
        };

        let block_time = self
            .chain
            .block_time(query.chain_id, query.block_number)
            .await?;
        Ok(Some(Price::new(
            query.chain_id,
            query.token,
            price_usd,
            PriceSource::YDaemon,
            query.block_number,
            block_time,
        )))
    }
}
