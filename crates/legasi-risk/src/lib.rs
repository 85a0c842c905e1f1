//! # Legasi Risk
//!
//! Pure risk functions for the Legasi lending protocol. Nothing here mutates
//! state; every function works on a [`Position`](legasi_common::Position)
//! and a [`MarketSnapshot`] taken at one instant.
//!
//! ## LTV model
//!
//! ```text
//! LTV      = borrowed_usd × 10000 / collateral_usd
//! max LTV  = base LTV + reputation bonus        (capped at 10000)
//! health   = (collateral_usd × max LTV / 10000) / max(borrowed_usd, 1)
//! ```
//!
//! Reputation bonus: score ≥ 400 → +500 bps, ≥ 200 → +300 bps,
//! ≥ 100 → +100 bps.
//!
//! ## GAD rate curve
//!
//! ```text
//! excess = LTV − threshold
//! rate   = min(excess² / 100, 1000)   (bps per crank)
//! ```
//!
//! Convex in the excess: small breaches unwind slowly, deep ones at most
//! 10% of the excess debt per crank.

pub mod flash;
pub mod gad;
pub mod interest;
pub mod ltv;
pub mod market;
pub mod report;
pub mod valuation;

pub use flash::flash_fee;
pub use gad::{excess_debt_usd6, gad_rate_bps, plan_unwind, UnwindPlan};
pub use interest::{accrue_position, accrued_interest};
pub use ltv::{
    current_ltv_bps, health_factor, is_healthy, ltv_bps, max_borrowable_usd, max_ltv_bps,
    max_withdrawable_usd, reputation_ltv_bonus_bps, within_ltv,
};
pub use market::MarketSnapshot;
pub use report::RiskReport;
pub use valuation::{
    asset_value_usd6, borrowed_value_usd, collateral_breakdown, collateral_value_usd,
    usd6_to_asset_units_ceil, AssetValue, CollateralBreakdown,
};
