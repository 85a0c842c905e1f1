//! LP vault - share pools funding borrowable liquidity
//!
//! One pool per borrowable asset. Shares are minted 1:1 into an empty pool
//! and pro rata afterwards; repaid interest raises the value of every share
//! without minting new ones.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use legasi_common::{AccountId, AssetId, LegasiError, Result, BPS_DENOMINATOR};

use crate::infra::TokenCustody;

/// Accounting of one asset's pool (native units)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpPool {
    pub total_deposits: u64,
    pub total_shares: u64,
    /// Fees withheld from interest
    pub insurance_fund: u64,
    pub shares: HashMap<AccountId, u64>,
}

impl LpPool {
    pub fn shares_of(&self, account: &AccountId) -> u64 {
        self.shares.get(account).copied().unwrap_or(0)
    }

    fn shares_for_deposit(&self, amount: u64) -> Result<u64> {
        if self.total_shares == 0 || self.total_deposits == 0 {
            return Ok(amount);
        }
        let shares = amount as u128 * self.total_shares as u128 / self.total_deposits as u128;
        u64::try_from(shares).map_err(|_| LegasiError::MathOverflow)
    }

    fn amount_for_shares(&self, shares: u64) -> u64 {
        if self.total_shares == 0 {
            return 0;
        }
        (shares as u128 * self.total_deposits as u128 / self.total_shares as u128) as u64
    }
}

/// Share pools keyed by asset
#[derive(Debug)]
pub struct LpVault {
    pools: DashMap<AssetId, LpPool>,
    insurance_fee_bps: u16,
}

impl LpVault {
    pub fn new(insurance_fee_bps: u16) -> Self {
        Self {
            pools: DashMap::new(),
            insurance_fee_bps,
        }
    }

    /// Deposit `amount` and mint shares for it
    pub fn deposit(
        &self,
        custody: &dyn TokenCustody,
        account: &AccountId,
        asset: &AssetId,
        amount: u64,
    ) -> Result<u64> {
        if amount == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let mut pool = self.pools.entry(asset.clone()).or_default();
        let minted = pool.shares_for_deposit(amount)?;
        if minted == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let total_deposits = pool.total_deposits.checked_add(amount).ok_or(LegasiError::MathOverflow)?;
        let total_shares = pool.total_shares.checked_add(minted).ok_or(LegasiError::MathOverflow)?;

        custody.transfer_in(account, asset, amount)?;

        pool.total_deposits = total_deposits;
        pool.total_shares = total_shares;
        *pool.shares.entry(account.clone()).or_insert(0) += minted;
        info!(%account, %asset, amount, minted, "LP deposit");
        Ok(minted)
    }

    /// Burn `shares` and pay out their current value
    pub fn withdraw(
        &self,
        custody: &dyn TokenCustody,
        account: &AccountId,
        asset: &AssetId,
        shares: u64,
    ) -> Result<u64> {
        if shares == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let mut pool = self
            .pools
            .get_mut(asset)
            .ok_or_else(|| LegasiError::InsufficientShares {
                asset: asset.clone(),
                requested: shares,
                held: 0,
            })?;
        let held = pool.shares_of(account);
        if shares > held {
            return Err(LegasiError::InsufficientShares {
                asset: asset.clone(),
                requested: shares,
                held,
            });
        }
        let amount = pool.amount_for_shares(shares);

        custody.transfer_out(account, asset, amount)?;

        pool.total_deposits -= amount;
        pool.total_shares -= shares;
        if held == shares {
            pool.shares.remove(account);
        } else if let Some(balance) = pool.shares.get_mut(account) {
            *balance -= shares;
        }
        info!(%account, %asset, shares, amount, "LP withdraw");
        Ok(amount)
    }

    /// Credit repaid interest, withholding the insurance fee. Returns the fee.
    ///
    /// With no shares outstanding the whole amount goes to insurance.
    pub fn credit_interest(&self, asset: &AssetId, interest: u64) -> u64 {
        if interest == 0 {
            return 0;
        }
        let mut pool = self.pools.entry(asset.clone()).or_default();
        let fee = if pool.total_shares == 0 {
            interest
        } else {
            (interest as u128 * self.insurance_fee_bps as u128 / BPS_DENOMINATOR as u128) as u64
        };
        pool.insurance_fund = pool.insurance_fund.saturating_add(fee);
        pool.total_deposits = pool.total_deposits.saturating_add(interest - fee);
        fee
    }

    pub fn pool(&self, asset: &AssetId) -> Option<LpPool> {
        self.pools.get(asset).map(|p| p.clone())
    }

    pub fn shares_of(&self, account: &AccountId, asset: &AssetId) -> u64 {
        self.pools
            .get(asset)
            .map(|p| p.shares_of(account))
            .unwrap_or(0)
    }

    /// Current redemption value of `account`'s shares
    pub fn value_of(&self, account: &AccountId, asset: &AssetId) -> u64 {
        self.pools
            .get(asset)
            .map(|p| p.amount_for_shares(p.shares_of(account)))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryCustody;

    fn setup() -> (InMemoryCustody, LpVault, AccountId, AccountId, AssetId) {
        let custody = InMemoryCustody::new();
        let lp1 = AccountId::new("lp1");
        let lp2 = AccountId::new("lp2");
        let usdc = AssetId::new("USDC");
        custody.mint(&lp1, &usdc, 10_000).unwrap();
        custody.mint(&lp2, &usdc, 10_000).unwrap();
        (custody, LpVault::new(500), lp1, lp2, usdc)
    }

    #[test]
    fn test_first_deposit_one_to_one() {
        let (custody, vault, lp1, _, usdc) = setup();
        assert_eq!(vault.deposit(&custody, &lp1, &usdc, 1_000).unwrap(), 1_000);
        assert_eq!(custody.reserve_of(&usdc), 1_000);
    }

    #[test]
    fn test_interest_raises_share_value() {
        let (custody, vault, lp1, lp2, usdc) = setup();
        vault.deposit(&custody, &lp1, &usdc, 1_000).unwrap();

        // 100 interest, 5% to insurance
        let fee = vault.credit_interest(&usdc, 100);
        assert_eq!(fee, 5);
        assert_eq!(vault.value_of(&lp1, &usdc), 1_095);

        // later depositor gets fewer shares per token
        let minted = vault.deposit(&custody, &lp2, &usdc, 1_095).unwrap();
        assert_eq!(minted, 1_000);
    }

    #[test]
    fn test_withdraw_more_than_held() {
        let (custody, vault, lp1, _, usdc) = setup();
        vault.deposit(&custody, &lp1, &usdc, 1_000).unwrap();

        let result = vault.withdraw(&custody, &lp1, &usdc, 1_001);
        assert!(matches!(
            result,
            Err(LegasiError::InsufficientShares { held: 1_000, .. })
        ));
        assert_eq!(vault.shares_of(&lp1, &usdc), 1_000);
    }

    #[test]
    fn test_withdraw_all() {
        let (custody, vault, lp1, _, usdc) = setup();
        vault.deposit(&custody, &lp1, &usdc, 1_000).unwrap();
        custody.seed_reserve(&usdc, 95).unwrap();
        vault.credit_interest(&usdc, 100);

        let paid = vault.withdraw(&custody, &lp1, &usdc, 1_000).unwrap();
        assert_eq!(paid, 1_095);
        assert_eq!(custody.balance_of(&lp1, &usdc), 10_095);
        let pool = vault.pool(&usdc).unwrap();
        assert_eq!(pool.total_shares, 0);
        assert!(pool.shares.is_empty());
    }

    #[test]
    fn test_interest_without_lps_goes_to_insurance() {
        let (_, vault, _, _, usdc) = setup();
        assert_eq!(vault.credit_interest(&usdc, 40), 40);
        assert_eq!(vault.pool(&usdc).unwrap().total_deposits, 0);
    }
}
