//! Loan-to-value, health factor and borrow/withdraw headroom
//!
//! Value-level functions take USD6 totals so callers can project a
//! position before mutating it. [`current_ltv_bps`] is the position-level
//! entry point.

use legasi_common::{Position, Result, BPS_DENOMINATOR, HEALTH_FACTOR_ONE};

use crate::market::MarketSnapshot;
use crate::valuation::{borrowed_value_usd, collateral_value_usd};

/// Tiered LTV bonus for a reputation score. Thresholds are inclusive.
pub fn reputation_ltv_bonus_bps(score: u32) -> u16 {
    match score {
        s if s >= 400 => 500,
        s if s >= 200 => 300,
        s if s >= 100 => 100,
        _ => 0,
    }
}

/// Base LTV plus reputation bonus, capped at 100%
pub fn max_ltv_bps(base_ltv_bps: u16, score: u32) -> u16 {
    base_ltv_bps
        .saturating_add(reputation_ltv_bonus_bps(score))
        .min(BPS_DENOMINATOR as u16)
}

/// `borrowed × 10000 / collateral`, 0 without collateral
pub fn ltv_bps(collateral_usd6: u64, borrowed_usd6: u64) -> u64 {
    if collateral_usd6 == 0 {
        return 0;
    }
    let ltv = borrowed_usd6 as u128 * BPS_DENOMINATOR as u128 / collateral_usd6 as u128;
    u64::try_from(ltv).unwrap_or(u64::MAX)
}

/// Current LTV of a position at the snapshot's prices
pub fn current_ltv_bps(position: &Position, market: &MarketSnapshot) -> Result<u64> {
    let collateral = collateral_value_usd(position, market)?;
    Ok(ltv_bps(collateral, borrowed_value_usd(position)))
}

/// Health factor with `HEALTH_FACTOR_ONE` as 1.0
///
/// `(collateral × maxLtv / 10000) / max(borrowed, 1)`, 0 without collateral.
/// A debt-free position reports its borrow capacity in micro-USD, which is
/// always far above 1.0.
pub fn health_factor(collateral_usd6: u64, borrowed_usd6: u64, max_ltv_bps: u16) -> u64 {
    if collateral_usd6 == 0 {
        return 0;
    }
    let capacity = collateral_usd6 as u128 * max_ltv_bps as u128 / BPS_DENOMINATOR as u128;
    let hf = capacity * HEALTH_FACTOR_ONE as u128 / borrowed_usd6.max(1) as u128;
    u64::try_from(hf).unwrap_or(u64::MAX)
}

#[inline]
pub fn is_healthy(health_factor: u64) -> bool {
    health_factor >= HEALTH_FACTOR_ONE
}

/// Additional USD6 that can be borrowed before reaching `max_ltv_bps`
pub fn max_borrowable_usd(collateral_usd6: u64, borrowed_usd6: u64, max_ltv_bps: u16) -> u64 {
    let capacity = collateral_usd6 as u128 * max_ltv_bps as u128 / BPS_DENOMINATOR as u128;
    let headroom = capacity.saturating_sub(borrowed_usd6 as u128);
    u64::try_from(headroom).unwrap_or(u64::MAX)
}

/// USD6 of collateral that can leave without exceeding `max_ltv_bps`
pub fn max_withdrawable_usd(collateral_usd6: u64, borrowed_usd6: u64, max_ltv_bps: u16) -> u64 {
    if borrowed_usd6 == 0 {
        return collateral_usd6;
    }
    if max_ltv_bps == 0 {
        return 0;
    }
    let required = (borrowed_usd6 as u128 * BPS_DENOMINATOR as u128).div_ceil(max_ltv_bps as u128);
    u64::try_from((collateral_usd6 as u128).saturating_sub(required)).unwrap_or(0)
}

/// Exact check that `borrowed / collateral <= max_ltv_bps / 10000`
pub fn within_ltv(collateral_usd6: u64, borrowed_usd6: u64, max_ltv_bps: u16) -> bool {
    borrowed_usd6 == 0
        || borrowed_usd6 as u128 * BPS_DENOMINATOR as u128
            <= collateral_usd6 as u128 * max_ltv_bps as u128
}
