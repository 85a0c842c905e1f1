//! Reputation store

use dashmap::DashMap;
use tracing::{info, warn};

use legasi_common::{AccountId, LegasiError, ReputationRecord, Result};

/// Per-account reputation, created lazily on the first event
#[derive(Debug, Default)]
pub struct ReputationStore {
    records: DashMap<AccountId, ReputationRecord>,
}

impl ReputationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a completed repayment worth `usd6`
    pub fn on_repay(&self, account: &AccountId, usd6: u64, now: i64) -> Result<ReputationRecord> {
        if usd6 == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let mut record = self.records.entry(account.clone()).or_default();
        record.record_repayment(usd6, now);
        info!(%account, score = record.score, repayments = record.successful_repayments, "Reputation credited");
        Ok(*record)
    }

    /// Apply a deleveraging penalty
    pub fn on_gad_event(&self, account: &AccountId, now: i64) -> ReputationRecord {
        let mut record = self.records.entry(account.clone()).or_default();
        let before = record.score;
        record.record_gad_event(now);
        warn!(%account, before, after = record.score, "Reputation penalized for GAD event");
        *record
    }

    /// Snapshot, zeroed for unknown accounts
    pub fn get(&self, account: &AccountId) -> ReputationRecord {
        self.records.get(account).map(|r| *r).unwrap_or_default()
    }

    pub fn score(&self, account: &AccountId) -> u32 {
        self.get(account).score
    }

    /// Every record, sorted by account
    pub fn snapshot(&self) -> Vec<(AccountId, ReputationRecord)> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }
}
