//! Market registry - collateral and borrowable asset configuration

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::info;

use legasi_common::{AssetId, BorrowableConfig, CollateralConfig, LegasiError, Result};
use legasi_risk::MarketSnapshot;

use crate::infra::PriceSource;

/// Registered assets and their risk parameters
#[derive(Debug, Default)]
pub struct MarketRegistry {
    collaterals: RwLock<HashMap<AssetId, CollateralConfig>>,
    borrowables: RwLock<HashMap<AssetId, BorrowableConfig>>,
}

impl MarketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a collateral asset
    pub fn register_collateral(&self, config: CollateralConfig) -> Result<()> {
        config.validate()?;
        info!(
            asset = %config.asset,
            max_ltv_bps = config.max_ltv_bps,
            liquidation_threshold_bps = config.liquidation_threshold_bps,
            "Collateral registered"
        );
        self.collaterals.write().insert(config.asset.clone(), config);
        Ok(())
    }

    /// Add or replace a borrowable asset
    pub fn register_borrowable(&self, config: BorrowableConfig) -> Result<()> {
        config.validate()?;
        info!(
            asset = %config.asset,
            interest_rate_bps = config.interest_rate_bps,
            "Borrowable registered"
        );
        self.borrowables.write().insert(config.asset.clone(), config);
        Ok(())
    }

    /// Toggle an asset in every role it is registered for
    pub fn set_asset_active(&self, asset: &AssetId, active: bool) -> Result<()> {
        let mut found = false;
        if let Some(config) = self.collaterals.write().get_mut(asset) {
            config.is_active = active;
            found = true;
        }
        if let Some(config) = self.borrowables.write().get_mut(asset) {
            config.is_active = active;
            found = true;
        }
        if !found {
            return Err(LegasiError::AssetNotActive(asset.clone()));
        }
        info!(%asset, active, "Asset status changed");
        Ok(())
    }

    /// Collateral config if registered and active
    pub fn active_collateral(&self, asset: &AssetId) -> Result<CollateralConfig> {
        self.collaterals
            .read()
            .get(asset)
            .filter(|c| c.is_active)
            .cloned()
            .ok_or_else(|| LegasiError::AssetNotActive(asset.clone()))
    }

    /// Borrowable config if registered and active
    pub fn active_borrowable(&self, asset: &AssetId) -> Result<BorrowableConfig> {
        self.borrowables
            .read()
            .get(asset)
            .filter(|b| b.is_active)
            .cloned()
            .ok_or_else(|| LegasiError::AssetNotActive(asset.clone()))
    }

    /// Borrowable config whether active or not (repay keeps working on paused assets)
    pub fn borrowable(&self, asset: &AssetId) -> Result<BorrowableConfig> {
        self.borrowables
            .read()
            .get(asset)
            .cloned()
            .ok_or_else(|| LegasiError::AssetNotActive(asset.clone()))
    }

    pub fn borrowables(&self) -> HashMap<AssetId, BorrowableConfig> {
        self.borrowables.read().clone()
    }

    pub fn collaterals(&self) -> Vec<CollateralConfig> {
        let mut list: Vec<_> = self.collaterals.read().values().cloned().collect();
        list.sort_by(|a, b| a.asset.cmp(&b.asset));
        list
    }

    /// Tightest liquidation threshold among active collateral assets
    pub fn min_active_liquidation_threshold(&self) -> Option<u16> {
        self.collaterals
            .read()
            .values()
            .filter(|c| c.is_active)
            .map(|c| c.liquidation_threshold_bps)
            .min()
    }

    /// Tightest liquidation threshold among the given registered assets
    pub fn min_liquidation_threshold_of<'a>(&self, assets: impl IntoIterator<Item = &'a AssetId>) -> Option<u16> {
        let collaterals = self.collaterals.read();
        assets
            .into_iter()
            .filter_map(|asset| collaterals.get(asset))
            .map(|c| c.liquidation_threshold_bps)
            .min()
    }

    /// Freeze configs and the latest prices of every collateral asset
    pub fn snapshot(&self, prices: &dyn PriceSource, now: i64, max_price_age_secs: i64) -> MarketSnapshot {
        let collaterals = self.collaterals.read();
        let mut snapshot = MarketSnapshot::new(now, max_price_age_secs);
        for (asset, config) in collaterals.iter() {
            if let Some(entry) = prices.get_price(asset) {
                snapshot = snapshot.with_price(asset.clone(), entry);
            }
            snapshot = snapshot.with_collateral(config.clone());
        }
        snapshot
    }
}
