//! Price sources: independent authorities that may know a token's USD price.
//!
//! Each source answers `Ok(Some(price))` on a hit and `Ok(None)` when it simply
//! has no data. Errors (RPC failures, HTTP failures, malformed payloads) are
//! reported as `Err` and turned into misses by the resolution engine.

use crate::chain::ChainError;
use crate::domain::{Address, BlockNumber, ChainId, Price, UnitsError};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod database;
pub mod eoracle;
pub mod http;
pub mod lens;
pub mod mock;
pub mod spork;
pub mod ydaemon;
pub mod yprice;

pub use database::DatabaseSource;
pub use eoracle::EOracleSource;
pub use http::HttpClient;
pub use lens::LensSource;
pub use mock::MockSource;
pub use spork::SporkSource;
pub use ydaemon::YDaemonSource;
pub use yprice::YPriceSource;

/// One price lookup, pinned to a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuery {
    pub chain_id: ChainId,
    pub token: Address,
    pub block_number: BlockNumber,
    /// The caller wants the freshest price rather than an exact-block one.
    pub latest: bool,
}

#[async_trait]
pub trait PriceProvider: Send + Sync + fmt::Debug {
    /// Short stable name used in logs.
    fn name(&self) -> &'static str;

    /// Whether a hit from this source is new information that must be persisted.
    fn persists(&self) -> bool {
        true
    }

    async fn fetch(&self, query: &PriceQuery) -> Result<Option<Price>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("network error: {0}")]
    Network(String),
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("rate limited")]
    RateLimited,
    #[error("parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Units(#[from] UnitsError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = SourceError::Http {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "http error 404: Not Found");
        assert_eq!(SourceError::RateLimited.to_string(), "rate limited");
        let err: SourceError = ChainError::Timeout(500).into();
        assert_eq!(err.to_string(), "rpc timed out after 500ms");
    }
}
