//! Simple-interest accrual on borrow balances

use std::collections::HashMap;

use legasi_common::{AssetId, BorrowableConfig, Position, BPS_DENOMINATOR, SECONDS_PER_YEAR};

/// Interest on `principal_usd6` at an annual `rate_bps` over `elapsed_secs`
pub fn accrued_interest(principal_usd6: u64, rate_bps: u16, elapsed_secs: i64) -> u64 {
    if elapsed_secs <= 0 || principal_usd6 == 0 || rate_bps == 0 {
        return 0;
    }
    let interest = principal_usd6 as u128 * rate_bps as u128 * elapsed_secs as u128
        / (BPS_DENOMINATOR as u128 * SECONDS_PER_YEAR as u128);
    u64::try_from(interest).unwrap_or(u64::MAX)
}

/// Accrue every borrow of `position` up to `now`, returning the interest added
///
/// Borrows in assets missing from `borrowables` keep their checkpoint.
pub fn accrue_position(
    position: &mut Position,
    borrowables: &HashMap<AssetId, BorrowableConfig>,
    now: i64,
) -> u64 {
    let mut total = 0u64;
    for (asset, balance) in position.borrows.iter_mut() {
        let Some(config) = borrowables.get(asset) else {
            continue;
        };
        if now <= balance.last_accrual {
            continue;
        }
        let interest = accrued_interest(balance.principal, config.interest_rate_bps, now - balance.last_accrual);
        // keep the checkpoint until a whole micro-USD has accrued
        if interest == 0 && balance.principal > 0 {
            continue;
        }
        balance.accrued_interest = balance.accrued_interest.saturating_add(interest);
        balance.last_accrual = now;
        total = total.saturating_add(interest);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use legasi_common::{AccountId, SECONDS_PER_DAY, USD_SCALE};

    const T0: i64 = 1_700_000_000;

    fn borrowables() -> HashMap<AssetId, BorrowableConfig> {
        let usdc = BorrowableConfig::new("USDC", 500, 6);
        HashMap::from([(usdc.asset.clone(), usdc)])
    }

    #[test]
    fn test_one_year_simple_interest() {
        // 5% on $1,000 for a year
        assert_eq!(accrued_interest(1_000 * USD_SCALE, 500, SECONDS_PER_YEAR), 50 * USD_SCALE);
    }

    #[test]
    fn test_no_time_no_interest() {
        assert_eq!(accrued_interest(1_000 * USD_SCALE, 500, 0), 0);
        assert_eq!(accrued_interest(1_000 * USD_SCALE, 500, -10), 0);
    }

    #[test]
    fn test_accrue_position() {
        let usdc = AssetId::new("USDC");
        let mut pos = Position::new(AccountId::new("alice"), T0);
        pos.record_borrow(&usdc, 1_000 * USD_SCALE, T0).unwrap();

        let added = accrue_position(&mut pos, &borrowables(), T0 + 30 * SECONDS_PER_DAY);
        assert!(added > 4 * USD_SCALE && added < 5 * USD_SCALE);
        assert_eq!(pos.borrows[&usdc].accrued_interest, added);
        assert_eq!(pos.borrows[&usdc].last_accrual, T0 + 30 * SECONDS_PER_DAY);

        // accruing again at the same instant is a no-op
        assert_eq!(accrue_position(&mut pos, &borrowables(), T0 + 30 * SECONDS_PER_DAY), 0);
    }

    #[test]
    fn test_short_interval_keeps_checkpoint() {
        let usdc = AssetId::new("USDC");
        let mut pos = Position::new(AccountId::new("alice"), T0);
        pos.record_borrow(&usdc, 1, T0).unwrap();

        assert_eq!(accrue_position(&mut pos, &borrowables(), T0 + 1), 0);
        assert_eq!(pos.borrows[&usdc].last_accrual, T0);
    }
}
