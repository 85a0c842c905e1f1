//! Scenario replay against an in-memory protocol
//!
//! A scenario is a JSON list of operations executed in order on a manual
//! clock. Failing steps are recorded and, unless `stop_on_error` is set, the
//! replay continues.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use legasi_common::{AccountId, AssetId, Position, ReputationRecord, Result};

use crate::config::EngineConfig;
use crate::infra::{Clock, InMemoryCustody, InMemoryPriceFeed, ManualClock};
use crate::protocol::LegasiProtocol;
use crate::x402::X402PaymentRequest;

/// Scenario file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Clock start, unix seconds
    #[serde(default = "default_start_time")]
    pub start_time: i64,
    #[serde(default)]
    pub stop_on_error: bool,
    pub steps: Vec<Step>,
}

fn default_start_time() -> i64 {
    1_700_000_000
}

/// One operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    SetPrice { asset: AssetId, price_usd6: u64 },
    Mint { account: AccountId, asset: AssetId, amount: u64 },
    SeedReserve { asset: AssetId, amount: u64 },
    Advance { secs: i64 },
    Deposit { account: AccountId, asset: AssetId, amount: u64 },
    Withdraw { account: AccountId, asset: AssetId, amount: u64 },
    Borrow { account: AccountId, asset: AssetId, amount: u64 },
    Repay { account: AccountId, asset: AssetId, amount: u64 },
    AccrueInterest { account: AccountId },
    ConfigureAgent {
        account: AccountId,
        daily_limit_usd6: u64,
        #[serde(default)]
        auto_repay: bool,
        #[serde(default)]
        x402_enabled: bool,
    },
    ConfigureGad {
        account: AccountId,
        enabled: bool,
        #[serde(default)]
        custom_threshold_bps: Option<u16>,
    },
    Crank {
        account: AccountId,
        #[serde(default)]
        cranker: Option<AccountId>,
    },
    Sweep {
        #[serde(default)]
        cranker: Option<AccountId>,
    },
    LpDeposit { account: AccountId, asset: AssetId, amount: u64 },
    LpWithdraw { account: AccountId, asset: AssetId, shares: u64 },
    X402Pay { account: AccountId, request: X402PaymentRequest },
    Report { account: AccountId },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::SetPrice { .. } => "set_price",
            Step::Mint { .. } => "mint",
            Step::SeedReserve { .. } => "seed_reserve",
            Step::Advance { .. } => "advance",
            Step::Deposit { .. } => "deposit",
            Step::Withdraw { .. } => "withdraw",
            Step::Borrow { .. } => "borrow",
            Step::Repay { .. } => "repay",
            Step::AccrueInterest { .. } => "accrue_interest",
            Step::ConfigureAgent { .. } => "configure_agent",
            Step::ConfigureGad { .. } => "configure_gad",
            Step::Crank { .. } => "crank",
            Step::Sweep { .. } => "sweep",
            Step::LpDeposit { .. } => "lp_deposit",
            Step::LpWithdraw { .. } => "lp_withdraw",
            Step::X402Pay { .. } => "x402_pay",
            Step::Report { .. } => "report",
        }
    }
}

/// Outcome of one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub op: String,
    pub at: i64,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final state after a replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub finished_at: i64,
    pub steps: Vec<StepResult>,
    pub positions: Vec<Position>,
    pub reputations: BTreeMap<AccountId, ReputationRecord>,
}

impl ScenarioReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| !s.ok)
    }
}

/// Protocol plus the in-memory collaborators a scenario drives
pub struct ScenarioRunner {
    clock: Arc<ManualClock>,
    prices: Arc<InMemoryPriceFeed>,
    custody: Arc<InMemoryCustody>,
    protocol: LegasiProtocol,
}

impl ScenarioRunner {
    pub fn new(config: EngineConfig, start_time: i64) -> Result<Self> {
        let clock = Arc::new(ManualClock::new(start_time));
        let prices = Arc::new(InMemoryPriceFeed::new(clock.clone()));
        let custody = Arc::new(InMemoryCustody::new());
        let protocol = LegasiProtocol::new(config, clock.clone(), prices.clone(), custody.clone())?;
        Ok(Self {
            clock,
            prices,
            custody,
            protocol,
        })
    }

    pub fn protocol(&self) -> &LegasiProtocol {
        &self.protocol
    }

    pub fn custody(&self) -> &InMemoryCustody {
        &self.custody
    }

    /// Replay every step of `scenario`
    pub fn run(&self, scenario: &Scenario) -> ScenarioReport {
        let mut steps = Vec::with_capacity(scenario.steps.len());

        for (index, step) in scenario.steps.iter().enumerate() {
            let result = self.apply(step);
            let at = self.clock.now();
            let (ok, output, error) = match result {
                Ok(output) => (true, Some(output), None),
                Err(err) => {
                    warn!(index, op = step.name(), error = %err, "Scenario step failed");
                    (false, None, Some(err.to_string()))
                }
            };
            steps.push(StepResult {
                index,
                op: step.name().to_string(),
                at,
                ok,
                output,
                error,
            });
            if !ok && scenario.stop_on_error {
                break;
            }
        }

        let ctx = self.protocol.context();
        let report = ScenarioReport {
            finished_at: self.clock.now(),
            steps,
            positions: ctx.ledger.snapshot(),
            reputations: ctx.reputation.snapshot().into_iter().collect(),
        };
        info!(
            steps = report.steps.len(),
            failures = report.failures().count(),
            "Scenario finished"
        );
        report
    }

    /// Execute one step, returning its output as JSON
    pub fn apply(&self, step: &Step) -> Result<Value> {
        let p = &self.protocol;
        let value = match step {
            Step::SetPrice { asset, price_usd6 } => serde_json::to_value(self.prices.update_price(asset, *price_usd6)?)?,
            Step::Mint { account, asset, amount } => serde_json::to_value(self.custody.mint(account, asset, *amount)?)?,
            Step::SeedReserve { asset, amount } => serde_json::to_value(self.custody.seed_reserve(asset, *amount)?)?,
            Step::Advance { secs } => serde_json::to_value(self.clock.advance(*secs))?,
            Step::Deposit { account, asset, amount } => serde_json::to_value(p.deposit(account, asset, *amount)?)?,
            Step::Withdraw { account, asset, amount } => serde_json::to_value(p.withdraw(account, asset, *amount)?)?,
            Step::Borrow { account, asset, amount } => serde_json::to_value(p.borrow(account, asset, *amount)?)?,
            Step::Repay { account, asset, amount } => serde_json::to_value(p.repay(account, asset, *amount)?)?,
            Step::AccrueInterest { account } => serde_json::to_value(p.accrue_interest(account)?)?,
            Step::ConfigureAgent {
                account,
                daily_limit_usd6,
                auto_repay,
                x402_enabled,
            } => serde_json::to_value(p.configure_agent(account, *daily_limit_usd6, *auto_repay, *x402_enabled)?)?,
            Step::ConfigureGad {
                account,
                enabled,
                custom_threshold_bps,
            } => serde_json::to_value(p.configure_gad(account, *enabled, *custom_threshold_bps)?)?,
            Step::Crank { account, cranker } => {
                let outcome = match cranker {
                    Some(cranker) => p.crank_gad_for(account, cranker)?,
                    None => p.crank_gad(account)?,
                };
                serde_json::to_value(outcome)?
            }
            Step::Sweep { cranker } => serde_json::to_value(p.keeper(cranker.clone()).sweep())?,
            Step::LpDeposit { account, asset, amount } => serde_json::to_value(p.lp_deposit(account, asset, *amount)?)?,
            Step::LpWithdraw { account, asset, shares } => serde_json::to_value(p.lp_withdraw(account, asset, *shares)?)?,
            Step::X402Pay { account, request } => serde_json::to_value(p.x402_pay(account, request)?)?,
            Step::Report { account } => serde_json::to_value(p.risk_report(account)?)?,
        };
        Ok(value)
    }
}

impl std::fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("now", &self.clock.now())
            .field("prices", &self.prices.len())
            .finish_non_exhaustive()
    }
}
