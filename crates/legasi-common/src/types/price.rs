//! Price feed entries

use serde::{Deserialize, Serialize};

/// Latest USD price for an asset, scaled by 1e6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub price_usd6: u64,
    /// Unix seconds of the last update
    pub last_update: i64,
}

impl PriceEntry {
    pub fn new(price_usd6: u64, last_update: i64) -> Self {
        Self {
            price_usd6,
            last_update,
        }
    }

    /// Seconds since the last update (0 for timestamps in the future)
    #[inline]
    pub fn age(&self, now: i64) -> i64 {
        now.saturating_sub(self.last_update).max(0)
    }

    /// A zero or stale price is unknown, never a valid quote
    pub fn is_usable(&self, now: i64, max_age_secs: i64) -> bool {
        self.price_usd6 > 0 && self.age(now) <= max_age_secs
    }
}
