//! AgentConfig - daily borrow limit for autonomous agents
//!
//! Borrowing is metered in one-day periods. A period starts at the first
//! borrow after the previous period lapsed, not at a calendar boundary.

use serde::{Deserialize, Serialize};

use crate::error::{LegasiError, Result};
use crate::SECONDS_PER_DAY;

/// Per-account agent configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub daily_borrow_limit_usd6: u64,
    pub daily_borrowed_usd6: u64,
    /// Unix seconds the current period started
    pub period_start: i64,
    pub auto_repay_enabled: bool,
    pub x402_enabled: bool,
}

impl AgentConfig {
    pub fn new(daily_borrow_limit_usd6: u64, auto_repay: bool, x402: bool, now: i64) -> Result<Self> {
        if daily_borrow_limit_usd6 == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        Ok(Self {
            daily_borrow_limit_usd6,
            daily_borrowed_usd6: 0,
            period_start: now,
            auto_repay_enabled: auto_repay,
            x402_enabled: x402,
        })
    }

    /// Change limits and flags, keeping the current period's usage
    pub fn update(&mut self, daily_borrow_limit_usd6: u64, auto_repay: bool, x402: bool) -> Result<()> {
        if daily_borrow_limit_usd6 == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        self.daily_borrow_limit_usd6 = daily_borrow_limit_usd6;
        self.auto_repay_enabled = auto_repay;
        self.x402_enabled = x402;
        Ok(())
    }

    #[inline]
    fn period_elapsed(&self, now: i64) -> bool {
        now.saturating_sub(self.period_start) >= SECONDS_PER_DAY
    }

    /// Usage counted against the limit at `now`
    pub fn borrowed_in_period(&self, now: i64) -> u64 {
        if self.period_elapsed(now) {
            0
        } else {
            self.daily_borrowed_usd6
        }
    }

    /// Headroom left in the period containing `now`
    pub fn remaining(&self, now: i64) -> u64 {
        self.daily_borrow_limit_usd6
            .saturating_sub(self.borrowed_in_period(now))
    }

    /// Check a borrow against the limit without consuming it
    pub fn check_borrow(&self, requested_usd6: u64, now: i64) -> Result<()> {
        let used = self.borrowed_in_period(now);
        let within = used
            .checked_add(requested_usd6)
            .map(|total| total <= self.daily_borrow_limit_usd6)
            .unwrap_or(false);
        if !within {
            return Err(LegasiError::DailyLimitExceeded {
                requested_usd6,
                remaining_usd6: self.remaining(now),
            });
        }
        Ok(())
    }

    /// Consume `requested_usd6` of the limit, rolling the period if it lapsed
    pub fn record_borrow(&mut self, requested_usd6: u64, now: i64) -> Result<()> {
        self.check_borrow(requested_usd6, now)?;
        if self.period_elapsed(now) {
            self.daily_borrowed_usd6 = 0;
            self.period_start = now;
        }
        self.daily_borrowed_usd6 += requested_usd6;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::USD_SCALE;

    const T0: i64 = 1_700_000_000;

    #[test]
    fn test_zero_limit_rejected() {
        assert_eq!(
            AgentConfig::new(0, false, false, T0),
            Err(LegasiError::InvalidAmount)
        );
    }

    #[test]
    fn test_daily_limit() {
        let mut agent = AgentConfig::new(1_000 * USD_SCALE, false, false, T0).unwrap();
        agent.record_borrow(600 * USD_SCALE, T0 + 10).unwrap();

        let result = agent.record_borrow(600 * USD_SCALE, T0 + 20);
        assert!(matches!(
            result,
            Err(LegasiError::DailyLimitExceeded { remaining_usd6, .. }) if remaining_usd6 == 400 * USD_SCALE
        ));
        assert_eq!(agent.daily_borrowed_usd6, 600 * USD_SCALE);
    }

    #[test]
    fn test_period_rollover() {
        let mut agent = AgentConfig::new(1_000 * USD_SCALE, false, false, T0).unwrap();
        agent.record_borrow(600 * USD_SCALE, T0).unwrap();

        let next_day = T0 + SECONDS_PER_DAY;
        assert_eq!(agent.remaining(next_day), 1_000 * USD_SCALE);
        agent.record_borrow(600 * USD_SCALE, next_day).unwrap();
        assert_eq!(agent.period_start, next_day);
        assert_eq!(agent.daily_borrowed_usd6, 600 * USD_SCALE);
    }

    #[test]
    fn test_update_keeps_usage() {
        let mut agent = AgentConfig::new(1_000 * USD_SCALE, false, false, T0).unwrap();
        agent.record_borrow(900 * USD_SCALE, T0).unwrap();
        agent.update(2_000 * USD_SCALE, true, true).unwrap();

        assert_eq!(agent.remaining(T0 + 1), 1_100 * USD_SCALE);
        assert!(agent.x402_enabled);
    }
}
