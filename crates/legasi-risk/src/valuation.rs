//! Collateral and debt valuation in USD6
//!
//! A non-zero balance whose price is stale or missing fails the whole
//! valuation with `PriceUnavailable`. It is never valued at zero.

use serde::{Deserialize, Serialize};

use legasi_common::{AssetId, LegasiError, Position, Result};

use crate::market::MarketSnapshot;

/// `amount` native units at `price_usd6` per whole unit, in USD6
pub fn asset_value_usd6(amount: u64, price_usd6: u64, decimals: u8) -> Result<u64> {
    let value = (amount as u128)
        .checked_mul(price_usd6 as u128)
        .ok_or(LegasiError::MathOverflow)?
        / 10u128.pow(decimals as u32);
    u64::try_from(value).map_err(|_| LegasiError::MathOverflow)
}

/// Native units needed to cover `usd6`, rounded up
pub fn usd6_to_asset_units_ceil(usd6: u64, price_usd6: u64, decimals: u8) -> Result<u64> {
    if price_usd6 == 0 {
        return Err(LegasiError::MathOverflow);
    }
    let numerator = (usd6 as u128)
        .checked_mul(10u128.pow(decimals as u32))
        .ok_or(LegasiError::MathOverflow)?;
    let units = numerator.div_ceil(price_usd6 as u128);
    u64::try_from(units).map_err(|_| LegasiError::MathOverflow)
}

/// Value of one collateral holding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetValue {
    pub asset: AssetId,
    pub amount: u64,
    pub price_usd6: u64,
    pub value_usd6: u64,
}

/// Collateral value with value-weighted risk parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollateralBreakdown {
    pub value_usd6: u64,
    /// Value-weighted base max LTV (0 without collateral)
    pub base_ltv_bps: u16,
    /// Value-weighted liquidation threshold (0 without collateral)
    pub liquidation_threshold_bps: u16,
    pub assets: Vec<AssetValue>,
}

/// Value every collateral holding and weight the per-asset parameters
pub fn collateral_breakdown(position: &Position, market: &MarketSnapshot) -> Result<CollateralBreakdown> {
    let mut breakdown = CollateralBreakdown::default();
    let mut ltv_weight: u128 = 0;
    let mut threshold_weight: u128 = 0;
    let mut total: u128 = 0;

    for (asset, &amount) in &position.collaterals {
        if amount == 0 {
            continue;
        }
        let config = market.collateral(asset)?;
        let price_usd6 = market.price_usd6(asset)?;
        let value_usd6 = asset_value_usd6(amount, price_usd6, config.decimals)?;

        total += value_usd6 as u128;
        ltv_weight += value_usd6 as u128 * config.max_ltv_bps as u128;
        threshold_weight += value_usd6 as u128 * config.liquidation_threshold_bps as u128;
        breakdown.assets.push(AssetValue {
            asset: asset.clone(),
            amount,
            price_usd6,
            value_usd6,
        });
    }

    if total > 0 {
        breakdown.value_usd6 = u64::try_from(total).map_err(|_| LegasiError::MathOverflow)?;
        // weighted averages of u16 values fit in u16
        breakdown.base_ltv_bps = (ltv_weight / total) as u16;
        breakdown.liquidation_threshold_bps = (threshold_weight / total) as u16;
    }
    Ok(breakdown)
}

/// Sum of collateral values (USD6)
pub fn collateral_value_usd(position: &Position, market: &MarketSnapshot) -> Result<u64> {
    collateral_breakdown(position, market).map(|b| b.value_usd6)
}

/// Sum of principal + accrued interest across borrows (USD6)
pub fn borrowed_value_usd(position: &Position) -> u64 {
    position
        .borrows
        .values()
        .fold(0u64, |acc, b| acc.saturating_add(b.total()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use legasi_common::{AccountId, CollateralConfig, PriceEntry};

    const NOW: i64 = 1_700_000_000;

    fn market() -> MarketSnapshot {
        MarketSnapshot::new(NOW, 300)
            .with_collateral(CollateralConfig::new("WETH", 7500, 8000, 500, 6))
            .with_collateral(CollateralConfig::new("WBTC", 7000, 7800, 500, 8))
            .with_price("WETH", PriceEntry::new(2_600_000_000, NOW))
            .with_price("WBTC", PriceEntry::new(60_000_000_000, NOW))
    }

    #[test]
    fn test_asset_value() {
        // 1 WETH (6 decimals) at $2,600
        assert_eq!(asset_value_usd6(1_000_000, 2_600_000_000, 6).unwrap(), 2_600_000_000);
        // 0.5 WBTC (8 decimals) at $60,000
        assert_eq!(asset_value_usd6(50_000_000, 60_000_000_000, 8).unwrap(), 30_000_000_000);
    }

    #[test]
    fn test_units_round_up() {
        // $1 of WETH at $3 needs 333_334 micro-units
        assert_eq!(usd6_to_asset_units_ceil(1_000_000, 3_000_000, 6).unwrap(), 333_334);
        assert_eq!(usd6_to_asset_units_ceil(2_600_000_000, 2_600_000_000, 6).unwrap(), 1_000_000);
    }

    #[test]
    fn test_weighted_parameters() {
        let mut pos = Position::new(AccountId::new("alice"), NOW);
        pos.deposit(&AssetId::new("WETH"), 1_000_000, NOW).unwrap();
        pos.deposit(&AssetId::new("WBTC"), 4_333_334, NOW).unwrap(); // ~$2,600

        let breakdown = collateral_breakdown(&pos, &market()).unwrap();
        assert_eq!(breakdown.assets.len(), 2);
        assert!(breakdown.base_ltv_bps > 7000 && breakdown.base_ltv_bps < 7500);
        assert!(breakdown.liquidation_threshold_bps > 7800 && breakdown.liquidation_threshold_bps < 8000);
    }

    #[test]
    fn test_single_collateral_uses_its_parameters() {
        let mut pos = Position::new(AccountId::new("alice"), NOW);
        pos.deposit(&AssetId::new("WETH"), 1_000_000, NOW).unwrap();

        let breakdown = collateral_breakdown(&pos, &market()).unwrap();
        assert_eq!(breakdown.value_usd6, 2_600_000_000);
        assert_eq!(breakdown.base_ltv_bps, 7500);
        assert_eq!(breakdown.liquidation_threshold_bps, 8000);
    }

    #[test]
    fn test_stale_price_fails_valuation() {
        let mut pos = Position::new(AccountId::new("alice"), NOW);
        pos.deposit(&AssetId::new("WETH"), 1_000_000, NOW).unwrap();

        let stale = market().with_price("WETH", PriceEntry::new(2_600_000_000, NOW - 301));
        assert!(matches!(
            collateral_value_usd(&pos, &stale),
            Err(LegasiError::PriceUnavailable(_))
        ));
    }

    #[test]
    fn test_empty_position_needs_no_price() {
        let pos = Position::new(AccountId::new("bob"), NOW);
        let market = MarketSnapshot::new(NOW, 300);
        assert_eq!(collateral_value_usd(&pos, &market), Ok(0));
        assert_eq!(borrowed_value_usd(&pos), 0);
    }
}
