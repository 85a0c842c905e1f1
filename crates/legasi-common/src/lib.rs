//! # Legasi Common
//!
//! Shared types, errors, and protocol constants for the Legasi lending risk engine.
//!
//! ## Core Types
//!
//! - [`AccountId`]/[`AssetId`]: string identifiers for accounts and assets
//! - [`Position`]: per-account collateral and debt balances
//! - [`CollateralConfig`]/[`BorrowableConfig`]: per-asset risk parameters
//! - [`PriceEntry`]: USD6 price with its update timestamp
//! - [`ReputationRecord`]: repayment history driving the LTV bonus
//! - [`AgentConfig`]: daily borrow limit for autonomous agents
//! - [`GadSettings`]: per-position gradual auto-deleveraging state
//!
//! ## Units
//!
//! Amounts are unsigned integers. Collateral is held at the asset's native
//! decimal scale, debt and all USD values are at 6 decimals (USD6), ratios are
//! basis points.

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{LegasiError, Result};
pub use types::{
    agent::AgentConfig,
    asset::{BorrowableConfig, CollateralConfig},
    gad::{GadSettings, GadState},
    ids::{AccountId, AssetId},
    position::{BorrowBalance, Position, RepaySplit},
    price::PriceEntry,
    reputation::ReputationRecord,
    units::{format_usd6, from_usd6, to_usd6, usd6_to_decimal},
};

/// Legasi version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Basis points denominator (100% = 10000)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// USD decimals (6)
pub const USD_DECIMALS: u8 = 6;

/// One whole USD at USD6 scale
pub const USD_SCALE: u64 = 1_000_000;

/// Seconds per day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Seconds per (non-leap) year, used for simple interest
pub const SECONDS_PER_YEAR: i64 = 31_536_000;

/// Highest decimals accepted for an asset
pub const MAX_ASSET_DECIMALS: u8 = 18;

/// Maximum GAD rate per crank (10%)
pub const MAX_GAD_RATE_BPS: u64 = 1_000;

/// Health factor fixed-point scale (1.0 == 10_000)
pub const HEALTH_FACTOR_ONE: u64 = 10_000;

/// Default price staleness window (seconds)
pub const DEFAULT_MAX_PRICE_AGE_SECS: i64 = 300;

/// Default minimum time between two GAD unwinds of one position (seconds)
pub const DEFAULT_GAD_CRANK_INTERVAL_SECS: i64 = 3_600;

/// Default cranker reward (basis points of unwound value)
pub const DEFAULT_CRANKER_REWARD_BPS: u16 = 50;

/// Default insurance fee on LP interest (basis points)
pub const DEFAULT_INSURANCE_FEE_BPS: u16 = 500;

/// Flash loan fee (basis points of the principal)
pub const FLASH_LOAN_FEE_BPS: u64 = 9;

/// Smallest flash loan fee (native units)
pub const MIN_FLASH_LOAN_FEE: u64 = 1;

/// Largest single x402 payment (1M USD)
pub const MAX_X402_PAYMENT_USD6: u64 = 1_000_000 * USD_SCALE;
