//! Price-source document: Spork asset mappings, eOracle feeds and lens overrides.
//!
//! Loaded once at startup. Any schema violation is fatal.

use super::ConfigError;
use crate::domain::{Address, ChainId};
use alloy_primitives::{address, U256};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Built-in lens oracle deployments.
const DEFAULT_LENS: [(ChainId, Address); 5] = [
    (1, address!("0x83d95e0d5f402511db06817aff3f9ea88224b030")),
    (10, address!("0xb082d9f4734c535d9d80536f7e87a6f4f471bf65")),
    (250, address!("0x57aa88a0810dfe3f9b71a9b179dd8bf5f956c46a")),
    (8453, address!("0xe0f3d78db7bc111996864a32d22ab0f59ca5fa86")),
    (42161, address!("0x043518ab266485dc085a1db095b8d9c2fc78e9b9")),
];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPriceConfig {
    spork: Vec<RawSporkAsset>,
    eoracle: HashMap<String, HashMap<String, RawFeed>>,
    #[serde(default)]
    lens: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSporkAsset {
    chain_id: ChainId,
    address: String,
    asset_id: String,
    default_price: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFeed {
    address: String,
}

/// Spork asset mapping for one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SporkAsset {
    pub chain_id: ChainId,
    pub address: Address,
    /// Spork asset identifier; empty when only a default price is known.
    pub asset_id: String,
    /// Fallback price as an 18-decimal integer.
    pub default_price: Option<U256>,
}

/// Immutable per-chain price-source configuration.
#[derive(Debug, Clone)]
pub struct PriceConfig {
    spork: Vec<SporkAsset>,
    eoracle: HashMap<ChainId, HashMap<Address, Address>>,
    lens: HashMap<ChainId, Address>,
}

impl PriceConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawPriceConfig =
            toml::from_str(content).map_err(|e| ConfigError::PriceConfig(e.to_string()))?;

        let spork = raw
            .spork
            .into_iter()
            .map(|asset| {
                let default_price = asset
                    .default_price
                    .as_deref()
                    .map(|p| {
                        U256::from_str_radix(p.trim(), 10).map_err(|_| {
                            ConfigError::PriceConfig(format!("invalid defaultPrice {:?}", p))
                        })
                    })
                    .transpose()?;
                Ok(SporkAsset {
                    chain_id: asset.chain_id,
                    address: parse_address(&asset.address)?,
                    asset_id: asset.asset_id.trim().to_string(),
                    default_price,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let mut eoracle = HashMap::new();
        for (chain, feeds) in raw.eoracle {
            let chain_id = parse_chain_id(&chain)?;
            let mut by_token = HashMap::new();
            for (token, feed) in feeds {
                by_token.insert(parse_address(&token)?, parse_address(&feed.address)?);
            }
            eoracle.insert(chain_id, by_token);
        }

        let mut lens: HashMap<ChainId, Address> = DEFAULT_LENS.into_iter().collect();
        for (chain, addr) in raw.lens {
            lens.insert(parse_chain_id(&chain)?, parse_address(&addr)?);
        }

        Ok(PriceConfig {
            spork,
            eoracle,
            lens,
        })
    }

    /// Configuration with no Spork assets or eOracle feeds, and the built-in lenses.
    pub fn empty() -> Self {
        PriceConfig {
            spork: Vec::new(),
            eoracle: HashMap::new(),
            lens: DEFAULT_LENS.into_iter().collect(),
        }
    }

    pub fn with_eoracle_feed(mut self, chain_id: ChainId, token: Address, feed: Address) -> Self {
        self.eoracle.entry(chain_id).or_default().insert(token, feed);
        self
    }

    pub fn with_spork_asset(mut self, asset: SporkAsset) -> Self {
        self.spork.push(asset);
        self
    }

    pub fn with_lens(mut self, chain_id: ChainId, lens: Address) -> Self {
        self.lens.insert(chain_id, lens);
        self
    }

    pub fn eoracle_feed(&self, chain_id: ChainId, token: &Address) -> Option<Address> {
        self.eoracle.get(&chain_id)?.get(token).copied()
    }

    pub fn spork_asset(&self, chain_id: ChainId, token: &Address) -> Option<&SporkAsset> {
        self.spork
            .iter()
            .find(|a| a.chain_id == chain_id && &a.address == token)
    }

    pub fn lens(&self, chain_id: ChainId) -> Option<Address> {
        self.lens.get(&chain_id).copied()
    }
}

fn parse_address(s: &str) -> Result<Address, ConfigError> {
    Address::from_str(s.trim())
        .map_err(|_| ConfigError::PriceConfig(format!("invalid address {:?}", s)))
}

fn parse_chain_id(s: &str) -> Result<ChainId, ConfigError> {
    s.trim()
        .parse::<ChainId>()
        .map_err(|_| ConfigError::PriceConfig(format!("invalid chain id {:?}", s)))
}
