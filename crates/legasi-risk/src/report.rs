//! Full risk picture of one position

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use legasi_common::{format_usd6, GadState, Position, Result};

use crate::gad::gad_rate_bps;
use crate::ltv::{
    health_factor, is_healthy, ltv_bps, max_borrowable_usd, max_ltv_bps, max_withdrawable_usd,
    reputation_ltv_bonus_bps,
};
use crate::market::MarketSnapshot;
use crate::valuation::{borrowed_value_usd, collateral_breakdown};

/// Risk metrics of a position at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskReport {
    pub collateral_value_usd6: u64,
    pub borrowed_value_usd6: u64,
    pub base_ltv_bps: u16,
    pub reputation_bonus_bps: u16,
    pub max_ltv_bps: u16,
    pub liquidation_threshold_bps: u16,
    /// Threshold GAD enforces (custom threshold if tighter)
    pub gad_threshold_bps: u16,
    pub current_ltv_bps: u64,
    pub gad_rate_bps: u64,
    pub gad_state: GadState,
    /// Fixed-point, 10_000 == 1.0
    pub health_factor: u64,
    pub max_borrowable_usd6: u64,
    pub max_withdrawable_usd6: u64,
}

impl RiskReport {
    /// Evaluate `position` against `market` for an account with `reputation_score`
    pub fn evaluate(position: &Position, market: &MarketSnapshot, reputation_score: u32) -> Result<Self> {
        let breakdown = collateral_breakdown(position, market)?;
        let collateral = breakdown.value_usd6;
        let borrowed = borrowed_value_usd(position);

        let max_ltv = max_ltv_bps(breakdown.base_ltv_bps, reputation_score);
        let current = ltv_bps(collateral, borrowed);
        let gad_threshold = position
            .gad
            .effective_threshold_bps(breakdown.liquidation_threshold_bps);
        let gad_rate = if position.gad.enabled && collateral > 0 {
            gad_rate_bps(current, gad_threshold as u64)
        } else {
            0
        };

        Ok(Self {
            collateral_value_usd6: collateral,
            borrowed_value_usd6: borrowed,
            base_ltv_bps: breakdown.base_ltv_bps,
            reputation_bonus_bps: reputation_ltv_bonus_bps(reputation_score),
            max_ltv_bps: max_ltv,
            liquidation_threshold_bps: breakdown.liquidation_threshold_bps,
            gad_threshold_bps: gad_threshold,
            current_ltv_bps: current,
            gad_rate_bps: gad_rate,
            gad_state: position.gad.state,
            health_factor: health_factor(collateral, borrowed, max_ltv),
            max_borrowable_usd6: max_borrowable_usd(collateral, borrowed, max_ltv),
            max_withdrawable_usd6: max_withdrawable_usd(collateral, borrowed, max_ltv),
        })
    }

    pub fn is_healthy(&self) -> bool {
        self.borrowed_value_usd6 == 0 || is_healthy(self.health_factor)
    }

    /// Health factor as a decimal (1.0 = at max LTV)
    pub fn health_factor_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.health_factor as i128, 4)
    }
}

impl std::fmt::Display for RiskReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RiskReport(collateral={}, borrowed={}, ltv={}bps, max_ltv={}bps, hf={}, gad={})",
            format_usd6(self.collateral_value_usd6),
            format_usd6(self.borrowed_value_usd6),
            self.current_ltv_bps,
            self.max_ltv_bps,
            self.health_factor_decimal(),
            self.gad_state
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legasi_common::{AccountId, AssetId, CollateralConfig, PriceEntry, USD_SCALE};

    const NOW: i64 = 1_700_000_000;

    fn market() -> MarketSnapshot {
        MarketSnapshot::new(NOW, 300)
            .with_collateral(CollateralConfig::new("WETH", 7500, 8000, 500, 6))
            .with_price("WETH", PriceEntry::new(2_600 * USD_SCALE, NOW))
    }

    fn scenario_position() -> Position {
        let mut pos = Position::new(AccountId::new("alice"), NOW);
        pos.deposit(&AssetId::new("WETH"), 1_000_000, NOW).unwrap();
        pos.record_borrow(&AssetId::new("USDC"), 500 * USD_SCALE, NOW).unwrap();
        pos
    }

    #[test]
    fn test_weth_usdc_scenario() {
        let report = RiskReport::evaluate(&scenario_position(), &market(), 0).unwrap();

        assert_eq!(report.collateral_value_usd6, 2_600 * USD_SCALE);
        assert_eq!(report.borrowed_value_usd6, 500 * USD_SCALE);
        assert_eq!(report.current_ltv_bps, 1923);
        assert_eq!(report.max_ltv_bps, 7500);
        assert_eq!(report.max_borrowable_usd6, 1_450 * USD_SCALE);
        assert_eq!(report.gad_rate_bps, 0);
        assert!(report.is_healthy());
    }

    #[test]
    fn test_reputation_raises_max_ltv() {
        let report = RiskReport::evaluate(&scenario_position(), &market(), 450).unwrap();
        assert_eq!(report.reputation_bonus_bps, 500);
        assert_eq!(report.max_ltv_bps, 8000);
        assert_eq!(report.max_borrowable_usd6, 1_580 * USD_SCALE);
    }

    #[test]
    fn test_custom_gad_threshold_reported() {
        let mut pos = scenario_position();
        pos.gad.custom_threshold_bps = Some(1_900);

        let report = RiskReport::evaluate(&pos, &market(), 0).unwrap();
        assert_eq!(report.gad_threshold_bps, 1_900);
        // excess 23 bps -> 23² / 100
        assert_eq!(report.gad_rate_bps, 5);
    }

    #[test]
    fn test_empty_position() {
        let pos = Position::new(AccountId::new("bob"), NOW);
        let report = RiskReport::evaluate(&pos, &market(), 0).unwrap();
        assert_eq!(report.collateral_value_usd6, 0);
        assert_eq!(report.health_factor, 0);
        assert!(report.is_healthy());
    }

    #[test]
    fn test_display() {
        let report = RiskReport::evaluate(&scenario_position(), &market(), 0).unwrap();
        let text = report.to_string();
        assert!(text.contains("collateral=$2600.00"));
        assert!(text.contains("ltv=1923bps"));
    }
}
