//! Resolved USD price and its provenance.

use crate::domain::{Address, BlockNumber, ChainId, Decimal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const COMPUTED_PREFIX: &str = "computed-";

/// Which provider produced a price.
///
/// `Computed` wraps the source of the underlying asset when a vault share
/// price is derived from it, so provenance survives composition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PriceSource {
    EOracle,
    YDaemon,
    Lens,
    Spork,
    YPrice,
    /// Recorded miss: no provider had a price.
    Na,
    Computed(Box<PriceSource>),
}

impl PriceSource {
    pub fn computed(inner: PriceSource) -> Self {
        PriceSource::Computed(Box::new(inner))
    }

    pub fn is_na(&self) -> bool {
        matches!(self, PriceSource::Na)
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSource::EOracle => write!(f, "eoracle"),
            PriceSource::YDaemon => write!(f, "ydaemon"),
            PriceSource::Lens => write!(f, "lens"),
            PriceSource::Spork => write!(f, "spork"),
            PriceSource::YPrice => write!(f, "yprice"),
            PriceSource::Na => write!(f, "na"),
            PriceSource::Computed(inner) => write!(f, "{}{}", COMPUTED_PREFIX, inner),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown price source: {0}")]
pub struct PriceSourceParseError(pub String);

impl FromStr for PriceSource {
    type Err = PriceSourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(inner) = s.strip_prefix(COMPUTED_PREFIX) {
            return inner
                .parse()
                .map(PriceSource::computed)
                .map_err(|_| PriceSourceParseError(s.to_string()));
        }
        match s {
            "eoracle" => Ok(PriceSource::EOracle),
            "ydaemon" => Ok(PriceSource::YDaemon),
            "lens" => Ok(PriceSource::Lens),
            "spork" => Ok(PriceSource::Spork),
            "yprice" => Ok(PriceSource::YPrice),
            "na" => Ok(PriceSource::Na),
            other => Err(PriceSourceParseError(other.to_string())),
        }
    }
}

impl Serialize for PriceSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PriceSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A USD price pinned to a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub chain_id: ChainId,
    pub address: Address,
    pub price_usd: Decimal,
    pub price_source: PriceSource,
    pub block_number: BlockNumber,
    pub block_time: DateTime<Utc>,
}

impl Price {
    pub fn new(
        chain_id: ChainId,
        address: Address,
        price_usd: Decimal,
        price_source: PriceSource,
        block_number: BlockNumber,
        block_time: DateTime<Utc>,
    ) -> Self {
        Self {
            chain_id,
            address,
            price_usd,
            price_source,
            block_number,
            block_time,
        }
    }

    /// Zero-priced `na` record for a token nobody could price.
    pub fn na(
        chain_id: ChainId,
        address: Address,
        block_number: BlockNumber,
        block_time: DateTime<Utc>,
    ) -> Self {
        Self::new(
            chain_id,
            address,
            Decimal::zero(),
            PriceSource::Na,
            block_number,
            block_time,
        )
    }
}
