//! Engine configuration

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use legasi_common::{
    BorrowableConfig, CollateralConfig, BPS_DENOMINATOR, DEFAULT_CRANKER_REWARD_BPS,
    DEFAULT_GAD_CRANK_INTERVAL_SECS, DEFAULT_INSURANCE_FEE_BPS, DEFAULT_MAX_PRICE_AGE_SECS,
};

/// Environment variable prefix (`LEGASI__RISK__MAX_PRICE_AGE_SECS=120`)
pub const ENV_PREFIX: &str = "LEGASI";

/// Legasi engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Risk computation settings
    pub risk: RiskSettings,
    /// Gradual auto-deleveraging settings
    pub gad: DeleveragingSettings,
    /// LP vault settings
    pub vault: VaultSettings,
    /// Collateral assets registered at start-up
    pub collateral: Vec<CollateralConfig>,
    /// Borrowable assets registered at start-up
    pub borrowable: Vec<BorrowableConfig>,
}

impl EngineConfig {
    /// Load from an optional TOML/JSON file, then `LEGASI__*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let cfg: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings no engine could run with
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.risk.max_price_age_secs > 0, "risk.max_price_age_secs must be positive");
        anyhow::ensure!(
            self.gad.min_crank_interval_secs >= 0,
            "gad.min_crank_interval_secs must not be negative"
        );
        anyhow::ensure!(
            (self.gad.cranker_reward_bps as u64) < BPS_DENOMINATOR,
            "gad.cranker_reward_bps must be below 10000"
        );
        anyhow::ensure!(self.gad.keeper_interval_secs > 0, "gad.keeper_interval_secs must be positive");
        anyhow::ensure!(
            (self.vault.insurance_fee_bps as u64) <= BPS_DENOMINATOR,
            "vault.insurance_fee_bps must not exceed 10000"
        );
        for collateral in &self.collateral {
            collateral.validate()?;
        }
        for borrowable in &self.borrowable {
            borrowable.validate()?;
        }
        Ok(())
    }
}

/// Risk computation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    /// Prices older than this are treated as unavailable
    pub max_price_age_secs: i64,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            max_price_age_secs: DEFAULT_MAX_PRICE_AGE_SECS,
        }
    }
}

/// Gradual auto-deleveraging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleveragingSettings {
    /// Minimum time between two unwinds of one position
    pub min_crank_interval_secs: i64,
    /// Reward paid to whoever cranks, on top of the unwound value
    pub cranker_reward_bps: u16,
    /// How often the keeper sweeps all positions
    pub keeper_interval_secs: u64,
}

impl Default for DeleveragingSettings {
    fn default() -> Self {
        Self {
            min_crank_interval_secs: DEFAULT_GAD_CRANK_INTERVAL_SECS,
            cranker_reward_bps: DEFAULT_CRANKER_REWARD_BPS,
            keeper_interval_secs: 60,
        }
    }
}

/// LP vault settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    /// Share of repaid interest kept by the insurance fund
    pub insurance_fee_bps: u16,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            insurance_fee_bps: DEFAULT_INSURANCE_FEE_BPS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.risk.max_price_age_secs, 300);
        assert_eq!(cfg.gad.min_crank_interval_secs, 3_600);
        assert_eq!(cfg.gad.cranker_reward_bps, 50);
        assert_eq!(cfg.vault.insurance_fee_bps, 500);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("legasi-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[risk]
max_price_age_secs = 120

[[collateral]]
asset = "WETH"
max_ltv_bps = 7500
liquidation_threshold_bps = 8000
decimals = 6

[[borrowable]]
asset = "USDC"
interest_rate_bps = 500
decimals = 6
"#
        )
        .unwrap();
        drop(file);

        let cfg = EngineConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cfg.risk.max_price_age_secs, 120);
        assert_eq!(cfg.gad.keeper_interval_secs, 60);
        assert_eq!(cfg.collateral.len(), 1);
        assert!(cfg.collateral[0].is_active);
        assert_eq!(cfg.borrowable[0].interest_rate_bps, 500);
    }

    #[test]
    fn test_invalid_collateral_rejected() {
        let cfg = EngineConfig {
            collateral: vec![CollateralConfig::new("WETH", 8000, 7500, 0, 6)],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
