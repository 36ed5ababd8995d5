//! Address validation and normalization.
//!
//! Every address that is stored, compared or returned goes through
//! [`parse_address`] so that equality against the hard-coded constants in the
//! crate root holds regardless of the casing the caller used.

use alloy::primitives::Address;

use crate::SweepError;

/// `true` iff `s` is `0x` followed by exactly 40 hex characters.
pub fn validate_address(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(hex) => hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// `true` for `"eth"`, `"native"` (any case) or the zero address.
pub fn is_native_currency(s: &str) -> bool {
    let lowered = s.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return false;
    }
    if lowered == "eth" || lowered == "native" {
        return true;
    }
    let digits = lowered.strip_prefix("0x").unwrap_or(&lowered);
    !digits.is_empty() && digits.len() <= 40 && digits.bytes().all(|b| b == b'0')
}

/// EIP-55 mixed-case rendering of `addr`.
pub fn to_checksummed_address(addr: &Address) -> String {
    addr.to_checksum(None)
}

/// Parses a token address, rejecting anything that does not pass
/// [`validate_address`].
pub fn parse_address(s: &str) -> Result<Address, SweepError> {
    let trimmed = s.trim();
    if !validate_address(trimmed) {
        return Err(SweepError::InvalidTokenAddress(s.to_string()));
    }
    trimmed
        .parse::<Address>()
        .map_err(|_| SweepError::InvalidTokenAddress(s.to_string()))
}

/// Same as [`parse_address`] but reports a recipient error.
pub fn parse_recipient(s: &str) -> Result<Address, SweepError> {
    parse_address(s).map_err(|_| SweepError::InvalidRecipient(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CLAWBANK_ADDRESS, WETH_ADDRESS};

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "",
            "0x",
            "16332535e2c27da578bc2e82beb09ce9d3c8eb07",
            "0x16332535e2c27da578bc2e82beb09ce9d3c8eb0",
            "0x16332535e2c27da578bc2e82beb09ce9d3c8eb077",
            "0x16332535e2c27da578bc2e82beb09ce9d3c8ebzz",
            "0X16332535e2c27da578bc2e82beb09ce9d3c8eb07",
            " 0x16332535e2c27da578bc2e82beb09ce9d3c8eb07",
        ] {
            assert!(!validate_address(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn accepts_any_case() {
        for good in [
            "0x16332535e2c27da578bc2e82beb09ce9d3c8eb07",
            "0x16332535E2C27DA578BC2E82BEB09CE9D3C8EB07",
            "0x16332535E2c27da578bC2e82bEb09Ce9d3C8EB07",
        ] {
            assert!(validate_address(good));
        }
    }

    #[test]
    fn native_currency_aliases() {
        assert!(is_native_currency("eth"));
        assert!(is_native_currency("ETH"));
        assert!(is_native_currency("native"));
        assert!(is_native_currency("Native"));
        assert!(is_native_currency("0x0000000000000000000000000000000000000000"));
        assert!(is_native_currency("0x0"));
        assert!(!is_native_currency(""));
        assert!(!is_native_currency("0x4200000000000000000000000000000000000006"));
        assert!(!is_native_currency("0x16332535e2c27da578bc2e82beb09ce9d3c8eb07"));
    }

    #[test]
    fn checksums_lowercase_input() {
        let parsed = parse_address("0x16332535e2c27da578bc2e82beb09ce9d3c8eb07").unwrap();
        assert_eq!(parsed, CLAWBANK_ADDRESS);
        assert_eq!(
            to_checksummed_address(&parsed),
            "0x16332535E2c27da578bC2e82bEb09Ce9d3C8EB07"
        );
        assert_eq!(
            to_checksummed_address(&WETH_ADDRESS),
            "0x4200000000000000000000000000000000000006"
        );
    }

    #[test]
    fn parse_errors_are_distinct() {
        assert!(matches!(
            parse_address("0xnothex"),
            Err(SweepError::InvalidTokenAddress(_))
        ));
        assert!(matches!(
            parse_recipient("bob"),
            Err(SweepError::InvalidRecipient(_))
        ));
    }
}
