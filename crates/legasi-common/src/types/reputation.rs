//! ReputationRecord - repayment track record driving the LTV bonus
//!
//! The score is recomputed from the counters on every event:
//!
//! ```text
//! score = min(50 × repayments, 500)
//!       + min(10 per $1,000 repaid, 100)
//!       + min(10 per 30 days of age, 100)
//!       − 100 × gad_events            (saturating at 0)
//! ```
//!
//! A GAD event additionally caps the score at `previous − 100`, so a
//! penalty is never absorbed by age points earned since the last update.

use serde::{Deserialize, Serialize};

use crate::{SECONDS_PER_DAY, USD_SCALE};

/// Points per successful repayment
pub const REPAYMENT_POINTS: u32 = 50;

/// Cap on repayment-count points
pub const REPAYMENT_POINTS_CAP: u32 = 500;

/// Points per $1,000 of cumulative repaid volume
pub const VOLUME_POINTS_PER_1K: u32 = 10;

/// Cap on volume points
pub const VOLUME_POINTS_CAP: u32 = 100;

/// Points per 30 days of account age
pub const AGE_POINTS_PER_30_DAYS: u32 = 10;

/// Cap on age points
pub const AGE_POINTS_CAP: u32 = 100;

/// Points removed per GAD event
pub const GAD_PENALTY_POINTS: u32 = 100;

/// Per-account reputation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReputationRecord {
    pub score: u32,
    pub successful_repayments: u32,
    pub total_repaid_usd6: u64,
    pub gad_events: u32,
    /// Unix seconds of the first recorded event (0 = no history)
    pub created_at: i64,
    pub last_update: i64,
}

impl ReputationRecord {
    /// Account age in whole days
    pub fn age_days(&self, now: i64) -> i64 {
        if self.created_at == 0 {
            return 0;
        }
        now.saturating_sub(self.created_at).max(0) / SECONDS_PER_DAY
    }

    /// Score implied by the counters at `now`
    pub fn compute_score(&self, now: i64) -> u32 {
        let repayments = self
            .successful_repayments
            .saturating_mul(REPAYMENT_POINTS)
            .min(REPAYMENT_POINTS_CAP);

        let thousands = self.total_repaid_usd6 / (1_000 * USD_SCALE);
        let volume = thousands
            .saturating_mul(VOLUME_POINTS_PER_1K as u64)
            .min(VOLUME_POINTS_CAP as u64) as u32;

        let months = (self.age_days(now) / 30) as u64;
        let age = months
            .saturating_mul(AGE_POINTS_PER_30_DAYS as u64)
            .min(AGE_POINTS_CAP as u64) as u32;

        (repayments + volume + age).saturating_sub(self.gad_events.saturating_mul(GAD_PENALTY_POINTS))
    }

    /// Record one completed repayment worth `usd6`
    pub fn record_repayment(&mut self, usd6: u64, now: i64) {
        self.ensure_created(now);
        self.successful_repayments = self.successful_repayments.saturating_add(1);
        self.total_repaid_usd6 = self.total_repaid_usd6.saturating_add(usd6);
        self.recalculate(now);
    }

    /// Record a deleveraging penalty
    pub fn record_gad_event(&mut self, now: i64) {
        self.ensure_created(now);
        let previous = self.score;
        self.gad_events = self.gad_events.saturating_add(1);
        self.recalculate(now);
        self.score = self.score.min(previous.saturating_sub(GAD_PENALTY_POINTS));
    }

    fn ensure_created(&mut self, now: i64) {
        if self.created_at == 0 {
            self.created_at = now;
        }
    }

    fn recalculate(&mut self, now: i64) {
        self.score = self.compute_score(now);
        self.last_update = now;
    }
}

impl std::fmt::Display for ReputationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Reputation(score={}, repayments={}, gad_events={})",
            self.score, self.successful_repayments, self.gad_events
        )
    }
}
