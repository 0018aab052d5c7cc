//! Scripted price source for testing the cascade without network calls.

use super::{PriceProvider, PriceQuery, SourceError};
use crate::chain::mock::synthetic_block_time;
use crate::domain::{Address, Decimal, Price, PriceSource};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Behaviour {
    Hit(Decimal, PriceSource),
    Miss,
    Fail,
}

/// Mock source answering every query the same way and recording what it was asked.
///
/// Clones share the recorded queries.
#[derive(Debug, Clone)]
pub struct MockSource {
    name: &'static str,
    behaviour: Behaviour,
    only_token: Option<Address>,
    persists: bool,
    queries: Arc<Mutex<Vec<PriceQuery>>>,
}

impl MockSource {
    fn with_behaviour(name: &'static str, behaviour: Behaviour) -> Self {
        Self {
            name,
            behaviour,
            only_token: None,
            persists: true,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Source that prices every token at `price_usd`.
    pub fn hit(name: &'static str, price_usd: Decimal, source: PriceSource) -> Self {
        Self::with_behaviour(name, Behaviour::Hit(price_usd, source))
    }

    pub fn miss(name: &'static str) -> Self {
        Self::with_behaviour(name, Behaviour::Miss)
    }

    /// Source whose every call fails with a network error.
    pub fn failing(name: &'static str) -> Self {
        Self::with_behaviour(name, Behaviour::Fail)
    }

    /// Restrict hits to `token`; other tokens miss.
    pub fn only_for(mut self, token: Address) -> Self {
        self.only_token = Some(token);
        self
    }

    /// Mark hits as already stored, like the database source.
    pub fn non_persisting(mut self) -> Self {
        self.persists = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn queries(&self) -> Vec<PriceQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PriceProvider for MockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn persists(&self) -> bool {
        self.persists
    }

    async fn fetch(&self, query: &PriceQuery) -> Result<Option<Price>, SourceError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }

        if self.only_token.is_some_and(|t| t != query.token) {
            return Ok(None);
        }

        match &self.behaviour {
            Behaviour::Hit(price_usd, source) => Ok(Some(Price::new(
                query.chain_id,
                query.token,
                *price_usd,
                source.clone(),
                query.block_number,
                synthetic_block_time(query.block_number),
            ))),
            Behaviour::Miss => Ok(None),
            Behaviour::Fail => Err(SourceError::Network(format!("{} unavailable", self.name))),
        }
    }
}
