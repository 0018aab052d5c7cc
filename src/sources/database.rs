//! Prices already persisted by an earlier resolution.

use super::{PriceProvider, PriceQuery, SourceError};
use crate::db::Repository;
use crate::domain::Price;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DatabaseSource {
    repo: Arc<Repository>,
}

impl DatabaseSource {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl PriceProvider for DatabaseSource {
    fn name(&self) -> &'static str {
        "database"
    }

    /// Rows found here are already stored.
    fn persists(&self) -> bool {
        false
    }

    async fn fetch(&self, query: &PriceQuery) -> Result<Option<Price>, SourceError> {
        Ok(self
            .repo
            .get_price(query.chain_id, &query.token, query.block_number)
            .await?)
    }
}
