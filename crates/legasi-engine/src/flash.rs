//! Flash loans - unsecured loans settled within one call
//!
//! The principal leaves the reserve, the borrower's callback runs, then the
//! principal plus fee is pulled back. If the callback fails or the repayment
//! cannot be pulled, the principal is reclaimed and the loan errors. The fee
//! is credited to the LP pool with the usual insurance split.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use legasi_common::{AccountId, AssetId, LegasiError, Result};
use legasi_risk::flash_fee;

use crate::context::ProtocolContext;

/// A loan in flight, as seen by the borrower's callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashLoan {
    pub id: Uuid,
    pub borrower: AccountId,
    pub asset: AssetId,
    /// Native units
    pub amount: u64,
    pub fee: u64,
    pub issued_at: i64,
}

impl FlashLoan {
    /// Principal plus fee
    pub fn owed(&self) -> u64 {
        self.amount.saturating_add(self.fee)
    }
}

/// A settled flash loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashReceipt {
    pub loan: FlashLoan,
    /// Part of the fee withheld by the insurance fund
    pub insurance_fee: u64,
}

/// Lends reserve liquidity for the duration of a callback
#[derive(Debug, Clone)]
pub struct FlashLender {
    ctx: Arc<ProtocolContext>,
}

impl FlashLender {
    pub fn new(ctx: Arc<ProtocolContext>) -> Self {
        Self { ctx }
    }

    /// Reserve balance a flash loan of `asset` can draw on
    pub fn available_liquidity(&self, asset: &AssetId) -> u64 {
        self.ctx.custody.reserve_of(asset)
    }

    /// Lend `amount` of `asset` to `account` while `f` runs
    ///
    /// `f` must leave the principal plus fee in `account`'s wallet.
    #[instrument(skip(self, f))]
    pub fn flash_loan<T>(
        &self,
        account: &AccountId,
        asset: &AssetId,
        amount: u64,
        f: impl FnOnce(&FlashLoan) -> Result<T>,
    ) -> Result<(T, FlashReceipt)> {
        if amount == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        self.ctx.markets.active_borrowable(asset)?;

        let available = self.available_liquidity(asset);
        if amount > available {
            warn!(%account, %asset, amount, available, "Rejected: flash loan exceeds liquidity");
            return Err(LegasiError::InsufficientLiquidity {
                asset: asset.clone(),
                requested: amount,
                available,
            });
        }

        let fee = flash_fee(amount);
        let owed = amount.checked_add(fee).ok_or(LegasiError::MathOverflow)?;
        let loan = FlashLoan {
            id: Uuid::now_v7(),
            borrower: account.clone(),
            asset: asset.clone(),
            amount,
            fee,
            issued_at: self.ctx.now(),
        };

        self.ctx.custody.transfer_out(account, asset, amount)?;

        let output = match f(&loan) {
            Ok(output) => output,
            Err(err) => {
                warn!(%account, %asset, error = %err, "Flash loan callback failed");
                self.reclaim(&loan);
                return Err(err);
            }
        };

        if let Err(err) = self.ctx.custody.transfer_in(account, asset, owed) {
            warn!(%account, %asset, owed, error = %err, "Flash loan not repaid");
            self.reclaim(&loan);
            return Err(LegasiError::FlashLoanNotRepaid {
                asset: asset.clone(),
                owed,
            });
        }

        let insurance_fee = self.ctx.vault.credit_interest(asset, fee);
        info!(%account, %asset, amount, fee, insurance_fee, "Flash loan settled");
        Ok((output, FlashReceipt { loan, insurance_fee }))
    }

    /// Pull the principal back after a failed loan
    fn reclaim(&self, loan: &FlashLoan) {
        if let Err(err) = self
            .ctx
            .custody
            .transfer_in(&loan.borrower, &loan.asset, loan.amount)
        {
            error!(
                borrower = %loan.borrower,
                asset = %loan.asset,
                amount = loan.amount,
                error = %err,
                "Flash loan principal not reclaimed"
            );
        }
    }
}
