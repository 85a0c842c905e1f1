//! Asset configuration (collateral and borrowable)

use serde::{Deserialize, Serialize};

use super::ids::AssetId;
use crate::error::{LegasiError, Result};
use crate::{BPS_DENOMINATOR, MAX_ASSET_DECIMALS};

fn default_active() -> bool {
    true
}

/// Collateral asset configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralConfig {
    pub asset: AssetId,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Base max LTV before any reputation bonus
    pub max_ltv_bps: u16,
    /// LTV above which gradual deleveraging starts
    pub liquidation_threshold_bps: u16,
    #[serde(default)]
    pub liquidation_bonus_bps: u16,
    pub decimals: u8,
}

impl CollateralConfig {
    pub fn new(
        asset: impl Into<AssetId>,
        max_ltv_bps: u16,
        liquidation_threshold_bps: u16,
        liquidation_bonus_bps: u16,
        decimals: u8,
    ) -> Self {
        Self {
            asset: asset.into(),
            is_active: true,
            max_ltv_bps,
            liquidation_threshold_bps,
            liquidation_bonus_bps,
            decimals,
        }
    }

    /// Check `max_ltv < liquidation_threshold <= 10000` and a sane decimal scale
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| LegasiError::InvalidAssetConfig {
            asset: self.asset.clone(),
            reason: reason.to_string(),
        };

        if self.liquidation_threshold_bps as u64 > BPS_DENOMINATOR {
            return Err(invalid("liquidation threshold above 10000 bps"));
        }
        if self.liquidation_threshold_bps <= self.max_ltv_bps {
            return Err(invalid("liquidation threshold must exceed max LTV"));
        }
        if self.liquidation_bonus_bps as u64 > BPS_DENOMINATOR {
            return Err(invalid("liquidation bonus above 10000 bps"));
        }
        if self.decimals > MAX_ASSET_DECIMALS {
            return Err(invalid("too many decimals"));
        }
        Ok(())
    }

    /// One whole unit of the asset in native units
    #[inline]
    pub fn unit_scale(&self) -> u128 {
        10u128.pow(self.decimals as u32)
    }
}

/// Borrowable (stable USD) asset configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowableConfig {
    pub asset: AssetId,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Annualized simple interest rate
    pub interest_rate_bps: u16,
    pub decimals: u8,
}

impl BorrowableConfig {
    pub fn new(asset: impl Into<AssetId>, interest_rate_bps: u16, decimals: u8) -> Self {
        Self {
            asset: asset.into(),
            is_active: true,
            interest_rate_bps,
            decimals,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.decimals > MAX_ASSET_DECIMALS {
            return Err(LegasiError::InvalidAssetConfig {
                asset: self.asset.clone(),
                reason: "too many decimals".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_collateral() {
        let weth = CollateralConfig::new("WETH", 7500, 8000, 500, 6);
        assert!(weth.validate().is_ok());
        assert_eq!(weth.unit_scale(), 1_000_000);
    }

    #[test]
    fn test_threshold_must_exceed_ltv() {
        let cfg = CollateralConfig::new("WETH", 8000, 8000, 500, 6);
        assert!(matches!(
            cfg.validate(),
            Err(LegasiError::InvalidAssetConfig { .. })
        ));

        let cfg = CollateralConfig::new("WETH", 7500, 10_001, 500, 6);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_deserialize_defaults_active() {
        let cfg: CollateralConfig = serde_json::from_str(
            r#"{"asset":"WBTC","max_ltv_bps":7000,"liquidation_threshold_bps":7800,"decimals":8}"#,
        )
        .unwrap();
        assert!(cfg.is_active);
        assert_eq!(cfg.liquidation_bonus_bps, 0);
    }
}
