//! LegasiProtocol - the engine's public surface
//!
//! Wires the context, controllers and gateway together and exposes one method
//! per caller-facing operation. Reads never fail on unknown accounts.

use std::sync::Arc;

use legasi_common::{
    AccountId, AgentConfig, AssetId, BorrowableConfig, CollateralConfig, GadSettings, GadState,
    Position, ReputationRecord, Result,
};
use legasi_risk::RiskReport;

use crate::config::EngineConfig;
use crate::context::ProtocolContext;
use crate::flash::{FlashLender, FlashLoan, FlashReceipt};
use crate::gad::{derived_gad_state, CrankOutcome, GadController, GadExecution};
use crate::infra::{Clock, PriceSource, TokenCustody};
use crate::keeper::GadKeeper;
use crate::lending::{LendingController, RepayOutcome};
use crate::vault::LpPool;
use crate::x402::{X402Gateway, X402PaymentRequest, X402Receipt, X402Stats};

/// Lending protocol with reputation-weighted LTV and gradual deleveraging
#[derive(Debug)]
pub struct LegasiProtocol {
    ctx: Arc<ProtocolContext>,
    lending: LendingController,
    gad: Arc<GadController>,
    flash: FlashLender,
    x402: X402Gateway,
}

impl LegasiProtocol {
    pub fn new(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        prices: Arc<dyn PriceSource>,
        custody: Arc<dyn TokenCustody>,
    ) -> Result<Self> {
        let ctx = Arc::new(ProtocolContext::new(config, clock, prices, custody)?);
        let lending = LendingController::new(ctx.clone());
        let gad = Arc::new(GadController::new(ctx.clone()));
        let flash = FlashLender::new(ctx.clone());
        let x402 = X402Gateway::new(ctx.clone(), lending.clone());
        Ok(Self {
            ctx,
            lending,
            gad,
            flash,
            x402,
        })
    }

    pub fn context(&self) -> &Arc<ProtocolContext> {
        &self.ctx
    }

    /// Keeper sharing this protocol's state
    pub fn keeper(&self, cranker: Option<AccountId>) -> GadKeeper {
        GadKeeper::new(self.ctx.clone(), self.gad.clone(), cranker)
    }

    // ---- markets ----

    pub fn register_collateral(&self, config: CollateralConfig) -> Result<()> {
        self.ctx.markets.register_collateral(config)
    }

    pub fn register_borrowable(&self, config: BorrowableConfig) -> Result<()> {
        self.ctx.markets.register_borrowable(config)
    }

    pub fn set_asset_active(&self, asset: &AssetId, active: bool) -> Result<()> {
        self.ctx.markets.set_asset_active(asset, active)
    }

    // ---- positions ----

    /// Current position, empty for unknown accounts
    ///
    /// The GAD state is re-derived from current prices.
    pub fn get_position(&self, account: &AccountId) -> Position {
        let now = self.ctx.now();
        let mut position = self.ctx.ledger.get_or_empty(account, now);
        position.gad.state = derived_gad_state(&position, &self.ctx.snapshot(now));
        position
    }

    pub fn deposit(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<Position> {
        self.lending.deposit(account, asset, amount)
    }

    pub fn withdraw(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<Position> {
        self.lending.withdraw(account, asset, amount)
    }

    pub fn borrow(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<Position> {
        self.lending.borrow(account, asset, amount)
    }

    pub fn repay(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<RepayOutcome> {
        self.lending.repay(account, asset, amount)
    }

    pub fn accrue_interest(&self, account: &AccountId) -> Result<Position> {
        self.lending.accrue_interest(account)
    }

    pub fn risk_report(&self, account: &AccountId) -> Result<RiskReport> {
        self.lending.risk_report(account)
    }

    // ---- reputation & agents ----

    pub fn get_reputation(&self, account: &AccountId) -> ReputationRecord {
        self.ctx.reputation.get(account)
    }

    pub fn configure_agent(
        &self,
        account: &AccountId,
        daily_limit_usd6: u64,
        auto_repay: bool,
        x402_enabled: bool,
    ) -> Result<AgentConfig> {
        self.ctx
            .agents
            .configure(account, daily_limit_usd6, auto_repay, x402_enabled, self.ctx.now())
    }

    pub fn get_agent(&self, account: &AccountId) -> Option<AgentConfig> {
        self.ctx.agents.get(account)
    }

    // ---- GAD ----

    pub fn configure_gad(
        &self,
        account: &AccountId,
        enabled: bool,
        custom_threshold_bps: Option<u16>,
    ) -> Result<GadSettings> {
        self.gad.configure_gad(account, enabled, custom_threshold_bps)
    }

    /// Crank without a reward recipient
    pub fn crank_gad(&self, account: &AccountId) -> Result<CrankOutcome> {
        self.gad.crank(account, None)
    }

    /// Crank on behalf of `cranker`, who receives the reward
    pub fn crank_gad_for(&self, account: &AccountId, cranker: &AccountId) -> Result<CrankOutcome> {
        self.gad.crank(account, Some(cranker))
    }

    pub fn evaluate_gad(&self, account: &AccountId) -> Result<GadState> {
        self.gad.evaluate(account)
    }

    pub fn gad_executions(&self, account: &AccountId) -> Vec<GadExecution> {
        self.gad.executions(account)
    }

    // ---- LP vault ----

    pub fn lp_deposit(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<u64> {
        self.ctx.markets.active_borrowable(asset)?;
        self.ctx
            .vault
            .deposit(self.ctx.custody.as_ref(), account, asset, amount)
    }

    pub fn lp_withdraw(&self, account: &AccountId, asset: &AssetId, shares: u64) -> Result<u64> {
        self.ctx
            .vault
            .withdraw(self.ctx.custody.as_ref(), account, asset, shares)
    }

    pub fn lp_pool(&self, asset: &AssetId) -> Option<LpPool> {
        self.ctx.vault.pool(asset)
    }

    // ---- flash loans ----

    pub fn flash_fee(&self, amount: u64) -> u64 {
        legasi_risk::flash_fee(amount)
    }

    pub fn available_liquidity(&self, asset: &AssetId) -> u64 {
        self.flash.available_liquidity(asset)
    }

    /// Lend `amount` while `f` runs; `f` must leave principal plus fee in the wallet
    pub fn flash_loan<T>(
        &self,
        account: &AccountId,
        asset: &AssetId,
        amount: u64,
        f: impl FnOnce(&FlashLoan) -> Result<T>,
    ) -> Result<(T, FlashReceipt)> {
        self.flash.flash_loan(account, asset, amount, f)
    }

    // ---- x402 ----

    pub fn x402_pay(&self, account: &AccountId, request: &X402PaymentRequest) -> Result<X402Receipt> {
        self.x402.pay(account, request)
    }

    pub fn x402_receipt(&self, payment_id: &str) -> Option<X402Receipt> {
        self.x402.receipt(payment_id)
    }

    pub fn x402_stats(&self, account: &AccountId) -> X402Stats {
        self.x402.stats(account)
    }
}
