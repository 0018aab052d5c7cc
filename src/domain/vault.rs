//! Vault registry records.

use crate::domain::{Address, ChainId};
use serde::{Deserialize, Serialize};

/// Registry label identifying vault records.
pub const VAULT_LABEL: &str = "vault";

/// Cached vault metadata, populated by vault discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultDefaults {
    pub decimals: u8,
    pub asset: Address,
}

/// A registry entry for an address carrying the `vault` label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultRegistration {
    pub chain_id: ChainId,
    pub address: Address,
    pub label: String,
    pub defaults: VaultDefaults,
}

impl VaultRegistration {
    pub fn new(chain_id: ChainId, address: Address, defaults: VaultDefaults) -> Self {
        Self {
            chain_id,
            address,
            label: VAULT_LABEL.to_string(),
            defaults,
        }
    }
}
