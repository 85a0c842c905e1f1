//! Point-in-time view of market configuration and prices

use std::collections::HashMap;

use legasi_common::{AssetId, CollateralConfig, LegasiError, PriceEntry, Result};

/// Collateral configs and prices as seen at `now`
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub collaterals: HashMap<AssetId, CollateralConfig>,
    pub prices: HashMap<AssetId, PriceEntry>,
    pub now: i64,
    pub max_price_age_secs: i64,
}

impl MarketSnapshot {
    pub fn new(now: i64, max_price_age_secs: i64) -> Self {
        Self {
            collaterals: HashMap::new(),
            prices: HashMap::new(),
            now,
            max_price_age_secs,
        }
    }

    pub fn with_collateral(mut self, config: CollateralConfig) -> Self {
        self.collaterals.insert(config.asset.clone(), config);
        self
    }

    pub fn with_price(mut self, asset: impl Into<AssetId>, entry: PriceEntry) -> Self {
        self.prices.insert(asset.into(), entry);
        self
    }

    /// Fresh, non-zero USD6 price or `PriceUnavailable`
    pub fn price_usd6(&self, asset: &AssetId) -> Result<u64> {
        self.prices
            .get(asset)
            .filter(|entry| entry.is_usable(self.now, self.max_price_age_secs))
            .map(|entry| entry.price_usd6)
            .ok_or_else(|| LegasiError::PriceUnavailable(asset.clone()))
    }

    /// Registered collateral config, active or not
    pub fn collateral(&self, asset: &AssetId) -> Result<&CollateralConfig> {
        self.collaterals
            .get(asset)
            .ok_or_else(|| LegasiError::AssetNotActive(asset.clone()))
    }
}
