//! Lending controller - deposit, withdraw, borrow and repay
//!
//! Every operation validates and projects on a draft of the position, moves
//! tokens last, and commits only if all of it succeeded.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use legasi_common::{
    from_usd6, to_usd6, AccountId, AssetId, LegasiError, Position, RepaySplit, ReputationRecord,
    Result, BPS_DENOMINATOR,
};
use legasi_risk::{
    accrue_position, borrowed_value_usd, collateral_breakdown, within_ltv, MarketSnapshot,
    RiskReport,
};

use crate::context::ProtocolContext;
use crate::gad::{derived_gad_state, refresh_gad_state};

/// Result of a repayment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepayOutcome {
    pub split: RepaySplit,
    /// Interest withheld by the insurance fund (native units)
    pub insurance_fee: u64,
    pub position: Position,
    pub reputation: ReputationRecord,
}

/// Orchestrates position changes against the ledger and risk engine
#[derive(Debug, Clone)]
pub struct LendingController {
    ctx: Arc<ProtocolContext>,
}

impl LendingController {
    pub fn new(ctx: Arc<ProtocolContext>) -> Self {
        Self { ctx }
    }

    /// Add collateral to `account`'s position
    #[instrument(skip(self))]
    pub fn deposit(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<Position> {
        if amount == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        self.ctx.markets.active_collateral(asset)?;
        let now = self.ctx.now();

        let position = self.ctx.ledger.with_position(account, now, |draft| {
            draft.deposit(asset, amount, now)?;
            self.ctx.custody.transfer_in(account, asset, amount)?;
            refresh_gad_state(draft, &self.ctx.snapshot(now));
            Ok(draft.clone())
        })?;

        info!(%account, %asset, amount, "Collateral deposited");
        Ok(position)
    }

    /// Remove collateral, keeping the position within its max LTV
    #[instrument(skip(self))]
    pub fn withdraw(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<Position> {
        if amount == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let now = self.ctx.now();
        let borrowables = self.ctx.markets.borrowables();

        let position = self.ctx.ledger.with_position(account, now, |draft| {
            accrue_position(draft, &borrowables, now);
            draft.withdraw(asset, amount, now)?;
            let snapshot = self.ctx.snapshot(now);
            if draft.has_debt() {
                self.ensure_within_max_ltv(account, draft, &snapshot)?;
            }
            self.ctx.custody.transfer_out(account, asset, amount)?;
            refresh_gad_state(draft, &snapshot);
            Ok(draft.clone())
        })?;

        info!(%account, %asset, amount, "Collateral withdrawn");
        Ok(position)
    }

    /// Borrow `amount` native units of a stable asset
    #[instrument(skip(self))]
    pub fn borrow(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<Position> {
        self.borrow_to(account, account, asset, amount)
    }

    /// Borrow against `account`'s position and pay `beneficiary`
    pub(crate) fn borrow_to(
        &self,
        account: &AccountId,
        beneficiary: &AccountId,
        asset: &AssetId,
        amount: u64,
    ) -> Result<Position> {
        if amount == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let config = self.ctx.markets.active_borrowable(asset)?;
        let usd6 = to_usd6(amount, config.decimals)?;
        if usd6 == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let now = self.ctx.now();
        let borrowables = self.ctx.markets.borrowables();

        let position = self.ctx.ledger.with_position(account, now, |draft| {
            accrue_position(draft, &borrowables, now);
            draft.record_borrow(asset, usd6, now)?;
            let snapshot = self.ctx.snapshot(now);
            self.ensure_within_max_ltv(account, draft, &snapshot)?;
            self.ctx.agents.gate_borrow(account, usd6, now, || {
                self.ctx.custody.transfer_out(beneficiary, asset, amount)
            })?;
            refresh_gad_state(draft, &snapshot);
            Ok(draft.clone())
        })?;

        info!(%account, %beneficiary, %asset, amount, usd6, "Borrowed");
        Ok(position)
    }

    /// Repay debt, interest first; overpayment is rejected
    #[instrument(skip(self))]
    pub fn repay(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<RepayOutcome> {
        if amount == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let config = self.ctx.markets.borrowable(asset)?;
        let usd6 = to_usd6(amount, config.decimals)?;
        if usd6 == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let now = self.ctx.now();
        let borrowables = self.ctx.markets.borrowables();

        let outcome = self.ctx.ledger.with_position(account, now, |draft| {
            accrue_position(draft, &borrowables, now);
            let split = draft.record_repay(asset, usd6, now)?;
            let interest = from_usd6(split.interest, config.decimals)?;

            self.ctx.custody.transfer_in(account, asset, amount)?;

            let insurance_fee = self.ctx.vault.credit_interest(asset, interest);
            let reputation = self.ctx.reputation.on_repay(account, usd6, now)?;
            refresh_gad_state(draft, &self.ctx.snapshot(now));
            Ok(RepayOutcome {
                split,
                insurance_fee,
                position: draft.clone(),
                reputation,
            })
        })?;

        info!(
            %account,
            %asset,
            amount,
            interest = outcome.split.interest,
            principal = outcome.split.principal,
            score = outcome.reputation.score,
            "Repaid"
        );
        Ok(outcome)
    }

    /// Bring accrued interest up to date
    #[instrument(skip(self))]
    pub fn accrue_interest(&self, account: &AccountId) -> Result<Position> {
        let now = self.ctx.now();
        let borrowables = self.ctx.markets.borrowables();
        self.ctx
            .ledger
            .with_existing(account, |draft| {
                if accrue_position(draft, &borrowables, now) > 0 {
                    draft.touch(now);
                }
                Ok(draft.clone())
            })
            .unwrap_or_else(|| Err(LegasiError::AccountNotFound(account.clone())))
    }

    /// Risk metrics with interest accrued up to now, without mutating anything
    pub fn risk_report(&self, account: &AccountId) -> Result<RiskReport> {
        let now = self.ctx.now();
        let mut position = self.ctx.ledger.get_or_empty(account, now);
        accrue_position(&mut position, &self.ctx.markets.borrowables(), now);
        let snapshot = self.ctx.snapshot(now);
        position.gad.state = derived_gad_state(&position, &snapshot);
        RiskReport::evaluate(&position, &snapshot, self.ctx.reputation.score(account))
    }

    fn ensure_within_max_ltv(&self, account: &AccountId, draft: &Position, snapshot: &MarketSnapshot) -> Result<()> {
        let breakdown = collateral_breakdown(draft, snapshot)?;
        let borrowed = borrowed_value_usd(draft);
        let max_ltv = self.ctx.max_ltv_for(account, &breakdown);
        if within_ltv(breakdown.value_usd6, borrowed, max_ltv) {
            return Ok(());
        }

        let projected = if breakdown.value_usd6 == 0 {
            u64::MAX
        } else {
            let ltv = (borrowed as u128 * BPS_DENOMINATOR as u128).div_ceil(breakdown.value_usd6 as u128);
            u64::try_from(ltv).unwrap_or(u64::MAX)
        };
        warn!(%account, projected_ltv_bps = projected, max_ltv_bps = max_ltv, "Rejected: would exceed max LTV");
        Err(LegasiError::WouldExceedMaxLtv {
            projected_ltv_bps: projected,
            max_ltv_bps: max_ltv,
        })
    }
}
