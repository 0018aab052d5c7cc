//! Domain types for token pricing and transfer valuation.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Fixed-point conversion of raw token amounts
//! - Price records with typed provenance
//! - Vault registry and transfer valuation types

pub mod decimal;
pub mod price;
pub mod primitives;
pub mod transfer;
pub mod units;
pub mod vault;

pub use decimal::Decimal;
pub use price::{Price, PriceSource, PriceSourceParseError};
pub use primitives::{checksummed, lower_hex, Address, BlockNumber, ChainId};
pub use transfer::{TransferEvent, Valuation};
pub use units::{scale_down, value_usd, UnitsError};
pub use vault::{VaultDefaults, VaultRegistration, VAULT_LABEL};
