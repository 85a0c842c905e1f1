//! Gradual Auto-Deleveraging rate curve and unwind sizing

use serde::{Deserialize, Serialize};

use legasi_common::{BPS_DENOMINATOR, MAX_GAD_RATE_BPS};

use crate::ltv::{ltv_bps, within_ltv};

/// Deleveraging rate for a position `current_ltv_bps` against `threshold_bps`
///
/// `min(excess² / 100, 1000)` where `excess = current − threshold`;
/// 0 at or below the threshold.
pub fn gad_rate_bps(current_ltv_bps: u64, threshold_bps: u64) -> u64 {
    if current_ltv_bps <= threshold_bps {
        return 0;
    }
    let excess = (current_ltv_bps - threshold_bps) as u128;
    (excess * excess / 100).min(MAX_GAD_RATE_BPS as u128) as u64
}

/// Debt that, repaid with collateral sold at par, brings the position back
/// to exactly `threshold_bps`
///
/// ```text
/// excess = (B × 10000 − T × C) / (10000 − T)
/// ```
pub fn excess_debt_usd6(collateral_usd6: u64, borrowed_usd6: u64, threshold_bps: u16) -> u64 {
    if within_ltv(collateral_usd6, borrowed_usd6, threshold_bps) {
        return 0;
    }
    let threshold = threshold_bps as u128;
    if threshold >= BPS_DENOMINATOR as u128 {
        return borrowed_usd6.saturating_sub(collateral_usd6);
    }
    let numerator = borrowed_usd6 as u128 * BPS_DENOMINATOR as u128 - threshold * collateral_usd6 as u128;
    let excess = numerator / (BPS_DENOMINATOR as u128 - threshold);
    excess.min(borrowed_usd6 as u128) as u64
}

/// One crank's worth of deleveraging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnwindPlan {
    pub rate_bps: u64,
    pub ltv_before_bps: u64,
    pub threshold_bps: u16,
    pub excess_usd6: u64,
    /// Debt to repay and collateral value to seize (USD6)
    pub unwind_usd6: u64,
}

/// Size the next unwind, `None` when the position is not over threshold
pub fn plan_unwind(collateral_usd6: u64, borrowed_usd6: u64, threshold_bps: u16) -> Option<UnwindPlan> {
    let ltv_before_bps = ltv_bps(collateral_usd6, borrowed_usd6);
    let rate_bps = gad_rate_bps(ltv_before_bps, threshold_bps as u64);
    let excess_usd6 = excess_debt_usd6(collateral_usd6, borrowed_usd6, threshold_bps);
    if rate_bps == 0 {
        return None;
    }

    let unwind = (excess_usd6 as u128 * rate_bps as u128 / BPS_DENOMINATOR as u128) as u64;
    // rate > 0 implies non-zero collateral and debt
    let unwind_usd6 = unwind.max(1).min(collateral_usd6).min(borrowed_usd6);

    Some(UnwindPlan {
        rate_bps,
        ltv_before_bps,
        threshold_bps,
        excess_usd6,
        unwind_usd6,
    })
}
