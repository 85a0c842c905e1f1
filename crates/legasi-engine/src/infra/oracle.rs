//! Price source

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use legasi_common::{AssetId, LegasiError, PriceEntry, Result};

use super::clock::Clock;

/// Read-only view of the latest USD6 price per asset
///
/// May return stale entries; staleness is judged by the consumer.
pub trait PriceSource: Send + Sync {
    fn get_price(&self, asset: &AssetId) -> Option<PriceEntry>;
}

/// Push-based price feed kept in memory
pub struct InMemoryPriceFeed {
    prices: DashMap<AssetId, PriceEntry>,
    clock: Arc<dyn Clock>,
}

impl InMemoryPriceFeed {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            prices: DashMap::new(),
            clock,
        }
    }

    /// Publish a price stamped with the current time
    pub fn update_price(&self, asset: &AssetId, price_usd6: u64) -> Result<PriceEntry> {
        if price_usd6 == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let entry = PriceEntry::new(price_usd6, self.clock.now());
        self.prices.insert(asset.clone(), entry);
        debug!(%asset, price_usd6, "Price updated");
        Ok(entry)
    }

    /// Insert an entry verbatim, including its timestamp
    pub fn set_entry(&self, asset: &AssetId, entry: PriceEntry) {
        self.prices.insert(asset.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl PriceSource for InMemoryPriceFeed {
    fn get_price(&self, asset: &AssetId) -> Option<PriceEntry> {
        self.prices.get(asset).map(|entry| *entry)
    }
}
