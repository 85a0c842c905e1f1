//! Agent registry and daily borrow-limit gate

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{info, warn};

use legasi_common::{AccountId, AgentConfig, Result};

/// Agent configurations keyed by account
///
/// Accounts without a configuration are not agents and are not limited.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    configs: DashMap<AccountId, AgentConfig>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or update an agent configuration
    pub fn configure(
        &self,
        account: &AccountId,
        daily_limit_usd6: u64,
        auto_repay: bool,
        x402_enabled: bool,
        now: i64,
    ) -> Result<AgentConfig> {
        let config = match self.configs.entry(account.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().update(daily_limit_usd6, auto_repay, x402_enabled)?;
                *entry.get()
            }
            Entry::Vacant(entry) => {
                let config = AgentConfig::new(daily_limit_usd6, auto_repay, x402_enabled, now)?;
                entry.insert(config);
                config
            }
        };
        info!(%account, daily_limit_usd6, auto_repay, x402_enabled, "Agent configured");
        Ok(config)
    }

    pub fn get(&self, account: &AccountId) -> Option<AgentConfig> {
        self.configs.get(account).map(|c| *c)
    }

    /// Run `f` if `requested_usd6` fits in the account's daily limit, and
    /// consume the limit only if `f` succeeds
    pub fn gate_borrow<T>(
        &self,
        account: &AccountId,
        requested_usd6: u64,
        now: i64,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let Some(mut config) = self.configs.get_mut(account) else {
            return f();
        };
        if let Err(err) = config.check_borrow(requested_usd6, now) {
            warn!(%account, requested_usd6, remaining_usd6 = config.remaining(now), "Daily limit reached");
            return Err(err);
        }
        let out = f()?;
        config.record_borrow(requested_usd6, now)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legasi_common::{LegasiError, SECONDS_PER_DAY, USD_SCALE};

    const T0: i64 = 1_700_000_000;

    #[test]
    fn test_non_agent_unlimited() {
        let agents = AgentRegistry::new();
        let out = agents.gate_borrow(&AccountId::new("human"), u64::MAX, T0, || Ok(7));
        assert_eq!(out, Ok(7));
    }

    #[test]
    fn test_gate_consumes_only_on_success() {
        let agents = AgentRegistry::new();
        let bot = AccountId::new("bot");
        agents.configure(&bot, 1_000 * USD_SCALE, false, false, T0).unwrap();

        let failed: Result<()> = agents.gate_borrow(&bot, 600 * USD_SCALE, T0, || Err(LegasiError::MathOverflow));
        assert!(failed.is_err());
        assert_eq!(agents.get(&bot).unwrap().daily_borrowed_usd6, 0);

        agents.gate_borrow(&bot, 600 * USD_SCALE, T0, || Ok(())).unwrap();
        let second = agents.gate_borrow(&bot, 600 * USD_SCALE, T0 + 60, || Ok(()));
        assert!(matches!(second, Err(LegasiError::DailyLimitExceeded { .. })));

        agents
            .gate_borrow(&bot, 600 * USD_SCALE, T0 + SECONDS_PER_DAY, || Ok(()))
            .unwrap();
    }

    #[test]
    fn test_reconfigure_keeps_usage() {
        let agents = AgentRegistry::new();
        let bot = AccountId::new("bot");
        agents.configure(&bot, 1_000 * USD_SCALE, false, false, T0).unwrap();
        agents.gate_borrow(&bot, 400 * USD_SCALE, T0, || Ok(())).unwrap();

        let config = agents.configure(&bot, 500 * USD_SCALE, true, true, T0 + 5).unwrap();
        assert_eq!(config.daily_borrowed_usd6, 400 * USD_SCALE);
        assert_eq!(config.remaining(T0 + 5), 100 * USD_SCALE);
        assert!(config.x402_enabled);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let agents = AgentRegistry::new();
        let bot = AccountId::new("bot");
        assert_eq!(
            agents.configure(&bot, 0, false, false, T0),
            Err(LegasiError::InvalidAmount)
        );
        assert!(agents.get(&bot).is_none());
    }
}
