//! Domain primitives: ChainId, BlockNumber, Address helpers.

pub use alloy_primitives::Address;

/// EVM chain identifier.
pub type ChainId = u64;

/// Block height on a chain.
pub type BlockNumber = u64;

/// Lower-case `0x`-prefixed hex form of an address, used as a lookup key.
pub fn lower_hex(address: &Address) -> String {
    address.to_string().to_lowercase()
}

/// Checksummed form of an address, used for display and storage.
pub fn checksummed(address: &Address) -> String {
    address.to_checksum(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

    #[test]
    fn test_lower_hex() {
        let addr = Address::from_str(WETH).unwrap();
        assert_eq!(lower_hex(&addr), WETH.to_lowercase());
    }

    #[test]
    fn test_checksummed_preserves_case() {
        let addr = Address::from_str(&WETH.to_lowercase()).unwrap();
        assert_eq!(checksummed(&addr), WETH);
    }
}
