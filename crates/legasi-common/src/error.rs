//! Error types for the Legasi risk engine
//!
//! One error type shared by the ledger, risk engine and controllers. Every
//! validation failure is raised before any state is mutated.

use thiserror::Error;

use crate::types::ids::{AccountId, AssetId};

/// Result type alias using LegasiError
pub type Result<T> = std::result::Result<T, LegasiError>;

/// Unified error type for Legasi operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LegasiError {
    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Asset is not active: {0}")]
    AssetNotActive(AssetId),

    #[error("Insufficient collateral in {asset}: requested {requested}, available {available}")]
    InsufficientCollateral {
        asset: AssetId,
        requested: u64,
        available: u64,
    },

    #[error("Repay exceeds debt in {asset}: requested {requested}, owed {owed}")]
    InsufficientDebt {
        asset: AssetId,
        requested: u64,
        owed: u64,
    },

    #[error("Operation would exceed max LTV: projected {projected_ltv_bps} bps > max {max_ltv_bps} bps")]
    WouldExceedMaxLtv {
        projected_ltv_bps: u64,
        max_ltv_bps: u16,
    },

    #[error("Daily borrow limit exceeded: requested {requested_usd6}, remaining {remaining_usd6}")]
    DailyLimitExceeded {
        requested_usd6: u64,
        remaining_usd6: u64,
    },

    #[error("GAD threshold too loose: requested {requested_bps} bps > allowed {max_bps} bps")]
    ThresholdTooLoose { requested_bps: u16, max_bps: u16 },

    #[error("Price unavailable for {0}")]
    PriceUnavailable(AssetId),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Invalid asset configuration for {asset}: {reason}")]
    InvalidAssetConfig { asset: AssetId, reason: String },

    #[error("Insufficient LP shares in {asset}: requested {requested}, held {held}")]
    InsufficientShares {
        asset: AssetId,
        requested: u64,
        held: u64,
    },

    #[error("Insufficient liquidity in {asset}: requested {requested}, available {available}")]
    InsufficientLiquidity {
        asset: AssetId,
        requested: u64,
        available: u64,
    },

    #[error("Flash loan not repaid: {owed} {asset} owed")]
    FlashLoanNotRepaid { asset: AssetId, owed: u64 },

    #[error("x402 payments are not enabled for {0}")]
    X402Disabled(AccountId),

    #[error("Payment request expired at {expires_at}")]
    PaymentExpired { expires_at: i64 },

    #[error("Duplicate payment: {0}")]
    DuplicatePayment(String),

    #[error("Custody error: {0}")]
    Custody(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Math overflow")]
    MathOverflow,
}

impl LegasiError {
    /// Whether retrying the same request later can succeed without changing it
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LegasiError::PriceUnavailable(_)
                | LegasiError::DailyLimitExceeded { .. }
                | LegasiError::InsufficientLiquidity { .. }
                | LegasiError::Custody(_)
        )
    }
}

impl From<serde_json::Error> for LegasiError {
    fn from(err: serde_json::Error) -> Self {
        LegasiError::Serialization(err.to_string())
    }
}
