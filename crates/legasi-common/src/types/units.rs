//! Fixed-point unit helpers

use rust_decimal::Decimal;

use crate::error::{LegasiError, Result};
use crate::USD_DECIMALS;

/// Rescale a native stable-asset amount to USD6
pub fn to_usd6(amount: u64, decimals: u8) -> Result<u64> {
    let usd_decimals = USD_DECIMALS as u32;
    let decimals = decimals as u32;
    let scaled = if decimals >= usd_decimals {
        (amount as u128) / 10u128.pow(decimals - usd_decimals)
    } else {
        (amount as u128)
            .checked_mul(10u128.pow(usd_decimals - decimals))
            .ok_or(LegasiError::MathOverflow)?
    };
    u64::try_from(scaled).map_err(|_| LegasiError::MathOverflow)
}

/// Rescale a USD6 amount back to a stable asset's native units
pub fn from_usd6(usd6: u64, decimals: u8) -> Result<u64> {
    let usd_decimals = USD_DECIMALS as u32;
    let decimals = decimals as u32;
    let scaled = if decimals >= usd_decimals {
        (usd6 as u128)
            .checked_mul(10u128.pow(decimals - usd_decimals))
            .ok_or(LegasiError::MathOverflow)?
    } else {
        (usd6 as u128) / 10u128.pow(usd_decimals - decimals)
    };
    u64::try_from(scaled).map_err(|_| LegasiError::MathOverflow)
}

/// USD6 integer as an exact decimal (1_500_000 -> 1.5)
pub fn usd6_to_decimal(usd6: u64) -> Decimal {
    Decimal::from_i128_with_scale(usd6 as i128, USD_DECIMALS as u32)
}

/// Human readable dollars, rounded to cents
pub fn format_usd6(usd6: u64) -> String {
    format!("${:.2}", usd6_to_decimal(usd6).round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_usd6() {
        assert_eq!(to_usd6(500_000_000, 6).unwrap(), 500_000_000);
        assert_eq!(to_usd6(5 * 10u64.pow(18), 18).unwrap(), 5_000_000);
        assert_eq!(to_usd6(5, 2).unwrap(), 50_000);
    }

    #[test]
    fn test_from_usd6() {
        assert_eq!(from_usd6(5_000_000, 18).unwrap(), 5 * 10u64.pow(18));
        assert_eq!(from_usd6(50_000, 2).unwrap(), 5);
        assert_eq!(from_usd6(u64::MAX, 18), Err(LegasiError::MathOverflow));
    }

    #[test]
    fn test_usd6_to_decimal() {
        assert_eq!(usd6_to_decimal(1_450_000_000), dec!(1450));
        assert_eq!(usd6_to_decimal(1_500_000), dec!(1.5));
    }

    #[test]
    fn test_format_usd6() {
        assert_eq!(format_usd6(2_600_000_000), "$2600.00");
        assert_eq!(format_usd6(1_234_567), "$1.23");
    }
}
