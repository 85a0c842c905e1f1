//! GAD controller - gradual auto-deleveraging of over-threshold positions
//!
//! ```text
//! Healthy ──(LTV > threshold)──▶ OverThreshold ──crank──▶ Unwinding
//!    ▲                                 ▲                      │
//!    └────────(LTV <= threshold)───────┴──────────────────────┘
//! ```
//!
//! A crank repays `excess × rate` of debt with collateral seized at par,
//! largest holding first. Positions are never liquidated in one step, and at
//! most one unwind is applied per crank interval.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use legasi_common::{
    AccountId, AssetId, BorrowableConfig, GadSettings, GadState, LegasiError, Position, Result,
    BPS_DENOMINATOR,
};
use legasi_risk::{
    accrue_position, asset_value_usd6, borrowed_value_usd, collateral_breakdown, ltv_bps,
    plan_unwind, usd6_to_asset_units_ceil, AssetValue, MarketSnapshot,
};

use crate::context::ProtocolContext;

/// Collateral taken from a position during an unwind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeizedCollateral {
    pub asset: AssetId,
    /// Native units
    pub amount: u64,
    pub value_usd6: u64,
}

/// One applied deleveraging step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GadExecution {
    pub id: Uuid,
    pub account: AccountId,
    pub executed_at: i64,
    pub rate_bps: u64,
    pub threshold_bps: u16,
    pub ltv_before_bps: u64,
    pub ltv_after_bps: u64,
    pub debt_reduced_usd6: u64,
    pub collateral_seized: Vec<SeizedCollateral>,
    pub cranker: Option<AccountId>,
    pub cranker_reward: Vec<SeizedCollateral>,
    pub state_after: GadState,
}

/// What a crank did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CrankOutcome {
    /// At or below threshold, nothing to do
    Healthy,
    /// Owner opted out of GAD
    Disabled,
    /// Over threshold but the breach is too small for a non-zero rate
    BelowMinimumRate { ltv_bps: u64, threshold_bps: u16 },
    /// Already unwound in the current interval
    TooSoon { next_eligible_at: i64 },
    Unwound(GadExecution),
}

impl CrankOutcome {
    pub fn is_unwound(&self) -> bool {
        matches!(self, CrankOutcome::Unwound(_))
    }
}

/// Classify a position against its effective GAD threshold
fn classify(position: &Position, snapshot: &MarketSnapshot) -> Result<GadState> {
    if !position.has_debt() {
        return Ok(GadState::Healthy);
    }
    let breakdown = collateral_breakdown(position, snapshot)?;
    if breakdown.value_usd6 == 0 {
        return Ok(GadState::Healthy);
    }
    let threshold = position
        .gad
        .effective_threshold_bps(breakdown.liquidation_threshold_bps);
    let ltv = ltv_bps(breakdown.value_usd6, borrowed_value_usd(position));
    Ok(GadState::classify(ltv, threshold as u64))
}

/// Update the stored GAD state after a position change
///
/// Best effort: without usable prices the previous state is kept.
pub(crate) fn refresh_gad_state(position: &mut Position, snapshot: &MarketSnapshot) -> GadState {
    let next = match classify(position, snapshot) {
        Ok(state) => state,
        Err(err) => {
            debug!(owner = %position.owner, error = %err, "GAD state not refreshed");
            return position.gad.state;
        }
    };
    if next != position.gad.state {
        match next {
            GadState::OverThreshold => warn!(owner = %position.owner, "Position crossed GAD threshold"),
            _ => info!(owner = %position.owner, state = %next, "Position GAD state changed"),
        }
        position.gad.state = next;
    }
    next
}

/// GAD state at current prices, without persisting it
///
/// Reads use this so a price move shows up before the next write or crank.
pub(crate) fn derived_gad_state(position: &Position, snapshot: &MarketSnapshot) -> GadState {
    classify(position, snapshot).unwrap_or(position.gad.state)
}

/// Drives the GAD state machine and applies unwinds
#[derive(Debug)]
pub struct GadController {
    ctx: Arc<ProtocolContext>,
    history: DashMap<AccountId, Vec<GadExecution>>,
}

impl GadController {
    pub fn new(ctx: Arc<ProtocolContext>) -> Self {
        Self {
            ctx,
            history: DashMap::new(),
        }
    }

    /// Opt in or out of GAD and optionally tighten the threshold
    #[instrument(skip(self))]
    pub fn configure_gad(
        &self,
        account: &AccountId,
        enabled: bool,
        custom_threshold_bps: Option<u16>,
    ) -> Result<GadSettings> {
        if custom_threshold_bps == Some(0) {
            return Err(LegasiError::InvalidAmount);
        }

        let now = self.ctx.now();
        let settings = self.ctx.ledger.with_position(account, now, |draft| {
            if let Some(requested) = custom_threshold_bps {
                let max_bps = self.threshold_ceiling(draft);
                if requested > max_bps {
                    return Err(LegasiError::ThresholdTooLoose {
                        requested_bps: requested,
                        max_bps,
                    });
                }
            }
            draft.gad.enabled = enabled;
            draft.gad.custom_threshold_bps = custom_threshold_bps;
            draft.touch(now);
            refresh_gad_state(draft, &self.ctx.snapshot(now));
            Ok(draft.gad.clone())
        })?;

        info!(%account, enabled, ?custom_threshold_bps, "GAD configured");
        Ok(settings)
    }

    /// Loosest custom threshold `position` may set
    ///
    /// Bounded by the collateral it holds, or by every active collateral
    /// asset while it holds none.
    fn threshold_ceiling(&self, position: &Position) -> u16 {
        let markets = &self.ctx.markets;
        markets
            .min_liquidation_threshold_of(position.collaterals.keys())
            .or_else(|| markets.min_active_liquidation_threshold())
            .unwrap_or(0)
    }

    /// Re-classify a position without unwinding it
    pub fn evaluate(&self, account: &AccountId) -> Result<GadState> {
        let now = self.ctx.now();
        let snapshot = self.ctx.snapshot(now);
        self.ctx
            .ledger
            .with_existing(account, |draft| {
                let next = classify(draft, &snapshot)?;
                if next != draft.gad.state {
                    draft.gad.state = next;
                    draft.touch(now);
                }
                Ok(next)
            })
            .unwrap_or(Ok(GadState::Healthy))
    }

    /// Apply at most one deleveraging step to `account`
    ///
    /// Healthy, unknown, opted-out and recently unwound positions are no-ops.
    /// Missing prices abort the crank and leave the position untouched.
    #[instrument(skip(self))]
    pub fn crank(&self, account: &AccountId, cranker: Option<&AccountId>) -> Result<CrankOutcome> {
        let now = self.ctx.now();
        let snapshot = self.ctx.snapshot(now);
        let borrowables = self.ctx.markets.borrowables();

        let result = self.ctx.ledger.with_existing(account, |draft| {
            self.crank_draft(account, cranker, draft, &snapshot, &borrowables, now)
        });

        let outcome = match result {
            None => {
                debug!(%account, "No position to crank");
                return Ok(CrankOutcome::Healthy);
            }
            Some(Err(err)) => {
                warn!(%account, error = %err, "GAD crank aborted");
                return Err(err);
            }
            Some(Ok(outcome)) => outcome,
        };

        match &outcome {
            CrankOutcome::Unwound(execution) => {
                info!(
                    %account,
                    rate_bps = execution.rate_bps,
                    ltv_before_bps = execution.ltv_before_bps,
                    ltv_after_bps = execution.ltv_after_bps,
                    debt_reduced_usd6 = execution.debt_reduced_usd6,
                    "GAD unwind applied"
                );
                self.history
                    .entry(account.clone())
                    .or_default()
                    .push(execution.clone());
            }
            other => debug!(%account, outcome = ?other, "GAD crank no-op"),
        }
        Ok(outcome)
    }

    /// Applied unwinds of `account`, oldest first
    pub fn executions(&self, account: &AccountId) -> Vec<GadExecution> {
        self.history
            .get(account)
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Seized collateral stays in the protocol reserve; only the cranker
    /// reward leaves it. The written-off debt is not credited to the LP pool.
    fn crank_draft(
        &self,
        account: &AccountId,
        cranker: Option<&AccountId>,
        draft: &mut Position,
        snapshot: &MarketSnapshot,
        borrowables: &HashMap<AssetId, BorrowableConfig>,
        now: i64,
    ) -> Result<CrankOutcome> {
        if !draft.gad.enabled {
            return Ok(CrankOutcome::Disabled);
        }
        accrue_position(draft, borrowables, now);

        let before = collateral_breakdown(draft, snapshot)?;
        let borrowed = borrowed_value_usd(draft);
        let threshold = draft
            .gad
            .effective_threshold_bps(before.liquidation_threshold_bps);

        let Some(plan) = plan_unwind(before.value_usd6, borrowed, threshold) else {
            let state = classify(draft, snapshot)?;
            set_state(draft, state, now);
            return Ok(match state {
                GadState::Healthy => CrankOutcome::Healthy,
                _ => CrankOutcome::BelowMinimumRate {
                    ltv_bps: ltv_bps(before.value_usd6, borrowed),
                    threshold_bps: threshold,
                },
            });
        };

        let settings = &self.ctx.config.gad;
        if draft.gad.within_crank_interval(now, settings.min_crank_interval_secs) {
            set_state(draft, GadState::OverThreshold, now);
            return Ok(CrankOutcome::TooSoon {
                next_eligible_at: draft.gad.last_crank + settings.min_crank_interval_secs,
            });
        }

        draft.gad.state = GadState::Unwinding;

        let mut holdings = before.assets.clone();
        holdings.sort_by(|a, b| b.value_usd6.cmp(&a.value_usd6).then_with(|| a.asset.cmp(&b.asset)));

        let collateral_seized = seize(draft, &holdings, plan.unwind_usd6, snapshot)?;
        let debt_reduced_usd6 = draft.reduce_debt(plan.unwind_usd6, now);

        let cranker_reward = match cranker {
            Some(_) if settings.cranker_reward_bps > 0 => {
                let reward_usd6 =
                    (plan.unwind_usd6 as u128 * settings.cranker_reward_bps as u128 / BPS_DENOMINATOR as u128) as u64;
                seize(draft, &holdings, reward_usd6, snapshot)?
            }
            _ => Vec::new(),
        };

        let after = collateral_breakdown(draft, snapshot)?;
        let borrowed_after = borrowed_value_usd(draft);
        let ltv_after_bps = ltv_bps(after.value_usd6, borrowed_after);
        let state_after = classify(draft, snapshot)?;

        // tokens move last; a failed payout aborts the whole unwind
        if let Some(cranker) = cranker {
            for reward in &cranker_reward {
                self.ctx.custody.transfer_out(cranker, &reward.asset, reward.amount)?;
            }
        }
        self.ctx.reputation.on_gad_event(account, now);

        draft.gad.state = state_after;
        draft.gad.last_crank = now;
        draft.gad.total_unwound_usd6 = draft.gad.total_unwound_usd6.saturating_add(debt_reduced_usd6);
        draft.touch(now);

        Ok(CrankOutcome::Unwound(GadExecution {
            id: Uuid::now_v7(),
            account: account.clone(),
            executed_at: now,
            rate_bps: plan.rate_bps,
            threshold_bps: threshold,
            ltv_before_bps: plan.ltv_before_bps,
            ltv_after_bps,
            debt_reduced_usd6,
            collateral_seized,
            cranker: cranker.cloned(),
            cranker_reward,
            state_after,
        }))
    }
}

fn set_state(position: &mut Position, state: GadState, now: i64) {
    if position.gad.state != state {
        position.gad.state = state;
        position.touch(now);
    }
}

/// Take `usd6` worth of collateral from `holdings` in order
fn seize(
    position: &mut Position,
    holdings: &[AssetValue],
    usd6: u64,
    snapshot: &MarketSnapshot,
) -> Result<Vec<SeizedCollateral>> {
    let mut remaining = usd6;
    let mut seized = Vec::new();

    for holding in holdings {
        if remaining == 0 {
            break;
        }
        let held = position.collateral_of(&holding.asset);
        if held == 0 {
            continue;
        }
        let decimals = snapshot.collateral(&holding.asset)?.decimals;
        let held_value = asset_value_usd6(held, holding.price_usd6, decimals)?;

        let (amount, value_usd6) = if held_value <= remaining {
            (held, held_value)
        } else {
            let units = usd6_to_asset_units_ceil(remaining, holding.price_usd6, decimals)?.min(held);
            (units, remaining)
        };
        position.set_collateral(&holding.asset, held - amount);
        remaining -= value_usd6;
        seized.push(SeizedCollateral {
            asset: holding.asset.clone(),
            amount,
            value_usd6,
        });
    }
    Ok(seized)
}
