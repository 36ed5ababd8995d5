use alloy::primitives::{
    utils::{format_units, parse_units, ParseUnits},
    U256,
};

use crate::SweepError;

/// Decimals of the native currency.
pub const NATIVE_DECIMALS: u8 = 18;

/// Scales a human-readable decimal string to raw units. Zero and negative
/// amounts are rejected.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, SweepError> {
    let trimmed = amount.trim();
    let parsed = parse_units(trimmed, decimals).map_err(|e| SweepError::InvalidAmount {
        amount: amount.to_string(),
        reason: e.to_string(),
    })?;
    match parsed {
        ParseUnits::U256(raw) if !raw.is_zero() => Ok(raw),
        _ => Err(SweepError::NonPositiveAmount),
    }
}

/// Rejects zero, negative and non-decimal amounts without knowing the
/// token's decimals yet.
pub fn ensure_positive(amount: &str) -> Result<(), SweepError> {
    let trimmed = amount.trim();
    if trimmed.strip_prefix('-').is_some_and(is_decimal) {
        return Err(SweepError::NonPositiveAmount);
    }
    if !is_decimal(trimmed) {
        return Err(SweepError::InvalidAmount {
            amount: amount.to_string(),
            reason: "not a decimal number".to_string(),
        });
    }
    if trimmed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        Ok(())
    } else {
        Err(SweepError::NonPositiveAmount)
    }
}

fn is_decimal(s: &str) -> bool {
    let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
    !(whole.is_empty() && fraction.is_empty())
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit())
}

pub fn parse_native_amount(amount: &str) -> Result<U256, SweepError> {
    parse_amount(amount, NATIVE_DECIMALS)
}

/// Renders raw units as a decimal string without trailing zeros.
pub fn format_amount(raw: U256, decimals: u8) -> String {
    let formatted = format_units(raw, decimals).unwrap_or_else(|_| raw.to_string());
    trim_decimal(&formatted)
}

pub fn format_native_amount(raw: U256) -> String {
    format_amount(raw, NATIVE_DECIMALS)
}

fn trim_decimal(s: &str) -> String {
    let trimmed = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    };
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_token_amounts() {
        let raw = U256::from(5000u64) * U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(format_amount(raw, 18), "5000");
    }

    #[test]
    fn formats_fractions_and_zero() {
        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_amount(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_amount(U256::ZERO, 18), "0");
        assert_eq!(format_amount(U256::from(42u64), 0), "42");
    }

    #[test]
    fn positivity_check_ignores_decimals() {
        assert!(ensure_positive("12.5").is_ok());
        assert!(ensure_positive(".000000000000000000000001").is_ok());
        assert!(matches!(ensure_positive("0.000"), Err(SweepError::NonPositiveAmount)));
        assert!(matches!(ensure_positive("-3"), Err(SweepError::NonPositiveAmount)));
        assert!(matches!(ensure_positive("1.2.3"), Err(SweepError::InvalidAmount { .. })));
        assert!(matches!(ensure_positive("."), Err(SweepError::InvalidAmount { .. })));
    }

    #[test]
    fn parses_native_amounts() {
        assert_eq!(
            parse_native_amount("0.1").unwrap(),
            U256::from(100_000_000_000_000_000u64)
        );
        assert_eq!(
            parse_amount("2.5", 6).unwrap(),
            U256::from(2_500_000u64)
        );
    }

    #[test]
    fn rejects_non_positive_and_garbage() {
        assert!(matches!(
            parse_native_amount("0"),
            Err(SweepError::NonPositiveAmount)
        ));
        assert!(matches!(
            parse_native_amount("-0.5"),
            Err(SweepError::NonPositiveAmount)
        ));
        assert!(matches!(
            parse_native_amount("lots"),
            Err(SweepError::InvalidAmount { .. })
        ));
    }
}
