//! Shared state and collaborators handed to every controller

use std::sync::Arc;

use legasi_common::{AccountId, Result};
use legasi_risk::{max_ltv_bps, CollateralBreakdown, MarketSnapshot};

use crate::agent::AgentRegistry;
use crate::config::EngineConfig;
use crate::infra::{Clock, PriceSource, TokenCustody};
use crate::ledger::PositionLedger;
use crate::market::MarketRegistry;
use crate::reputation::ReputationStore;
use crate::vault::LpVault;

/// Everything the protocol reads and writes
///
/// Lock order within one operation: position, reputation/agent, custody.
pub struct ProtocolContext {
    pub config: EngineConfig,
    pub clock: Arc<dyn Clock>,
    pub prices: Arc<dyn PriceSource>,
    pub custody: Arc<dyn TokenCustody>,
    pub markets: MarketRegistry,
    pub ledger: PositionLedger,
    pub reputation: ReputationStore,
    pub agents: AgentRegistry,
    pub vault: LpVault,
}

impl ProtocolContext {
    /// Build a context and register the configured markets
    pub fn new(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        prices: Arc<dyn PriceSource>,
        custody: Arc<dyn TokenCustody>,
    ) -> Result<Self> {
        let markets = MarketRegistry::new();
        for collateral in &config.collateral {
            markets.register_collateral(collateral.clone())?;
        }
        for borrowable in &config.borrowable {
            markets.register_borrowable(borrowable.clone())?;
        }
        let vault = LpVault::new(config.vault.insurance_fee_bps);

        Ok(Self {
            config,
            clock,
            prices,
            custody,
            markets,
            ledger: PositionLedger::new(),
            reputation: ReputationStore::new(),
            agents: AgentRegistry::new(),
            vault,
        })
    }

    #[inline]
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Market configs and latest prices at `now`
    pub fn snapshot(&self, now: i64) -> MarketSnapshot {
        self.markets
            .snapshot(self.prices.as_ref(), now, self.config.risk.max_price_age_secs)
    }

    /// Max LTV of `account` given its collateral mix
    pub fn max_ltv_for(&self, account: &AccountId, breakdown: &CollateralBreakdown) -> u16 {
        max_ltv_bps(breakdown.base_ltv_bps, self.reputation.score(account))
    }
}

impl std::fmt::Debug for ProtocolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolContext")
            .field("config", &self.config)
            .field("positions", &self.ledger.len())
            .finish_non_exhaustive()
    }
}
