//! Position - per-account collateral and debt ledger entry
//!
//! A position holds:
//! - Collateral balances at each asset's native decimal scale
//! - Debt balances (principal + accrued interest) at USD6 scale
//! - GAD settings and bookkeeping
//! - A version bumped on every mutation
//!
//! Zero balances are pruned, so an asset present in a map always has a
//! non-zero amount. Positions are never deleted; they can return to empty.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::gad::GadSettings;
use super::ids::{AccountId, AssetId};
use crate::error::{LegasiError, Result};

/// Outstanding debt in one borrowable asset (USD6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BorrowBalance {
    pub principal: u64,
    pub accrued_interest: u64,
    /// Unix seconds interest was last accrued up to
    pub last_accrual: i64,
}

impl BorrowBalance {
    #[inline]
    pub fn total(&self) -> u64 {
        self.principal.saturating_add(self.accrued_interest)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.principal == 0 && self.accrued_interest == 0
    }

    /// Pay down interest first, then principal
    fn pay(&mut self, amount: u64) -> RepaySplit {
        let interest = amount.min(self.accrued_interest);
        self.accrued_interest -= interest;
        let principal = (amount - interest).min(self.principal);
        self.principal -= principal;
        RepaySplit {
            interest,
            principal,
        }
    }
}

/// How a repayment was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepaySplit {
    pub interest: u64,
    pub principal: u64,
}

impl RepaySplit {
    #[inline]
    pub fn total(&self) -> u64 {
        self.interest + self.principal
    }
}

/// Account position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub owner: AccountId,
    pub collaterals: BTreeMap<AssetId, u64>,
    pub borrows: BTreeMap<AssetId, BorrowBalance>,
    pub gad: GadSettings,
    pub created_at: i64,
    pub last_update: i64,
    /// Version for optimistic concurrency
    pub version: u64,
}

impl Position {
    /// Create an empty position
    pub fn new(owner: AccountId, now: i64) -> Self {
        Self {
            owner,
            collaterals: BTreeMap::new(),
            borrows: BTreeMap::new(),
            gad: GadSettings::default(),
            created_at: now,
            last_update: now,
            version: 0,
        }
    }

    /// Collateral held in `asset` (0 if absent)
    pub fn collateral_of(&self, asset: &AssetId) -> u64 {
        self.collaterals.get(asset).copied().unwrap_or(0)
    }

    /// Total owed in `asset` (principal + interest, USD6)
    pub fn debt_of(&self, asset: &AssetId) -> u64 {
        self.borrows.get(asset).map(BorrowBalance::total).unwrap_or(0)
    }

    pub fn has_debt(&self) -> bool {
        self.borrows.values().any(|b| !b.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.collaterals.is_empty() && !self.has_debt()
    }

    /// Add collateral
    pub fn deposit(&mut self, asset: &AssetId, amount: u64, now: i64) -> Result<()> {
        if amount == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let balance = self.collaterals.entry(asset.clone()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LegasiError::MathOverflow)?;
        self.touch(now);
        Ok(())
    }

    /// Remove collateral (no LTV check - callers own that)
    pub fn withdraw(&mut self, asset: &AssetId, amount: u64, now: i64) -> Result<()> {
        if amount == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let available = self.collateral_of(asset);
        if amount > available {
            return Err(LegasiError::InsufficientCollateral {
                asset: asset.clone(),
                requested: amount,
                available,
            });
        }
        self.set_collateral(asset, available - amount);
        self.touch(now);
        Ok(())
    }

    /// Add principal to a borrow (USD6)
    pub fn record_borrow(&mut self, asset: &AssetId, amount_usd6: u64, now: i64) -> Result<()> {
        if amount_usd6 == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let entry = self.borrows.entry(asset.clone()).or_insert(BorrowBalance {
            last_accrual: now,
            ..Default::default()
        });
        entry.principal = entry
            .principal
            .checked_add(amount_usd6)
            .ok_or(LegasiError::MathOverflow)?;
        self.touch(now);
        Ok(())
    }

    /// Repay a borrow (USD6); overpayment is rejected, never clamped
    pub fn record_repay(&mut self, asset: &AssetId, amount_usd6: u64, now: i64) -> Result<RepaySplit> {
        if amount_usd6 == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let owed = self.debt_of(asset);
        if amount_usd6 > owed {
            return Err(LegasiError::InsufficientDebt {
                asset: asset.clone(),
                requested: amount_usd6,
                owed,
            });
        }
        let split = match self.borrows.get_mut(asset) {
            Some(balance) => balance.pay(amount_usd6),
            None => RepaySplit::default(),
        };
        self.prune();
        self.touch(now);
        Ok(split)
    }

    /// Reduce debt across all borrows in asset order, interest first.
    /// Returns how much was actually reduced (capped at total debt).
    pub fn reduce_debt(&mut self, amount_usd6: u64, now: i64) -> u64 {
        let mut remaining = amount_usd6;
        for balance in self.borrows.values_mut() {
            if remaining == 0 {
                break;
            }
            let paid = balance.pay(remaining.min(balance.total()));
            remaining -= paid.total();
        }
        self.prune();
        self.touch(now);
        amount_usd6 - remaining
    }

    /// Overwrite a collateral balance, pruning zeros
    pub fn set_collateral(&mut self, asset: &AssetId, amount: u64) {
        if amount == 0 {
            self.collaterals.remove(asset);
        } else {
            self.collaterals.insert(asset.clone(), amount);
        }
    }

    /// Drop zero-amount entries
    pub fn prune(&mut self) {
        self.collaterals.retain(|_, amount| *amount > 0);
        self.borrows.retain(|_, balance| !balance.is_empty());
    }

    /// Update version and timestamp
    pub fn touch(&mut self, now: i64) {
        self.version += 1;
        self.last_update = now;
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Position({}, collaterals={}, borrows={}, gad={})",
            self.owner,
            self.collaterals.len(),
            self.borrows.len(),
            self.gad.state
        )
    }
}
