//! Gradual Auto-Deleveraging (GAD) per-position state

use serde::{Deserialize, Serialize};

/// Where a position sits relative to its deleveraging threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GadState {
    /// current LTV <= threshold
    #[default]
    Healthy,
    /// current LTV > threshold, GAD active
    OverThreshold,
    /// A deleveraging step is being applied
    Unwinding,
}

impl GadState {
    /// Classify a position from its LTV and effective threshold
    pub fn classify(current_ltv_bps: u64, threshold_bps: u64) -> Self {
        if current_ltv_bps > threshold_bps {
            GadState::OverThreshold
        } else {
            GadState::Healthy
        }
    }
}

impl std::fmt::Display for GadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GadState::Healthy => "healthy",
            GadState::OverThreshold => "over_threshold",
            GadState::Unwinding => "unwinding",
        };
        f.write_str(name)
    }
}

/// GAD configuration and bookkeeping stored on a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GadSettings {
    pub enabled: bool,
    /// Optional threshold tighter than the collateral's liquidation threshold
    pub custom_threshold_bps: Option<u16>,
    pub state: GadState,
    /// Unix seconds of the last applied unwind (0 = never)
    pub last_crank: i64,
    /// Cumulative debt reduced by GAD (USD6)
    pub total_unwound_usd6: u64,
}

impl Default for GadSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            custom_threshold_bps: None,
            state: GadState::Healthy,
            last_crank: 0,
            total_unwound_usd6: 0,
        }
    }
}

impl GadSettings {
    /// Threshold actually enforced: the tighter of custom and market threshold
    pub fn effective_threshold_bps(&self, market_threshold_bps: u16) -> u16 {
        match self.custom_threshold_bps {
            Some(custom) => custom.min(market_threshold_bps),
            None => market_threshold_bps,
        }
    }

    /// Whether an unwind at `now` falls in the same evaluation window as the last one
    pub fn within_crank_interval(&self, now: i64, min_interval_secs: i64) -> bool {
        self.last_crank != 0 && now.saturating_sub(self.last_crank) < min_interval_secs
    }
}
