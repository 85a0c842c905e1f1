//! Token custody
//!
//! Transfers are atomic: they either move the full amount or fail without
//! touching any balance.

use dashmap::DashMap;
use tracing::debug;

use legasi_common::{AccountId, AssetId, LegasiError, Result};

/// Moves tokens between account wallets and the protocol reserve
pub trait TokenCustody: Send + Sync {
    /// Pull `amount` native units from `account` into the reserve
    fn transfer_in(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<()>;

    /// Pay `amount` native units from the reserve to `account`
    fn transfer_out(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<()>;

    /// Native units of `asset` held by the reserve
    fn reserve_of(&self, asset: &AssetId) -> u64;
}

/// Ledger-only custody for simulation and tests
#[derive(Debug, Default)]
pub struct InMemoryCustody {
    wallets: DashMap<(AccountId, AssetId), u64>,
    reserves: DashMap<AssetId, u64>,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a wallet out of thin air (faucet)
    pub fn mint(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<u64> {
        let mut balance = self
            .wallets
            .entry((account.clone(), asset.clone()))
            .or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LegasiError::MathOverflow)?;
        debug!(%account, %asset, amount, "Minted");
        Ok(*balance)
    }

    /// Add liquidity straight to the reserve
    pub fn seed_reserve(&self, asset: &AssetId, amount: u64) -> Result<u64> {
        let mut reserve = self.reserves.entry(asset.clone()).or_insert(0);
        *reserve = reserve.checked_add(amount).ok_or(LegasiError::MathOverflow)?;
        Ok(*reserve)
    }

    pub fn balance_of(&self, account: &AccountId, asset: &AssetId) -> u64 {
        self.wallets
            .get(&(account.clone(), asset.clone()))
            .map(|b| *b)
            .unwrap_or(0)
    }
}

impl TokenCustody for InMemoryCustody {
    fn transfer_in(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<()> {
        // lock order: wallet, then reserve
        let mut wallet = self
            .wallets
            .entry((account.clone(), asset.clone()))
            .or_insert(0);
        if *wallet < amount {
            return Err(LegasiError::Custody(format!(
                "{account} holds {} {asset}, needs {amount}",
                *wallet
            )));
        }
        let mut reserve = self.reserves.entry(asset.clone()).or_insert(0);
        *reserve = reserve.checked_add(amount).ok_or(LegasiError::MathOverflow)?;
        *wallet -= amount;
        Ok(())
    }

    fn transfer_out(&self, account: &AccountId, asset: &AssetId, amount: u64) -> Result<()> {
        let mut wallet = self
            .wallets
            .entry((account.clone(), asset.clone()))
            .or_insert(0);
        let mut reserve = self.reserves.entry(asset.clone()).or_insert(0);
        if *reserve < amount {
            return Err(LegasiError::Custody(format!(
                "reserve holds {} {asset}, needs {amount}",
                *reserve
            )));
        }
        *wallet = wallet.checked_add(amount).ok_or(LegasiError::MathOverflow)?;
        *reserve -= amount;
        Ok(())
    }

    fn reserve_of(&self, asset: &AssetId) -> u64 {
        self.reserves.get(asset).map(|r| *r).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_round_trip() {
        let custody = InMemoryCustody::new();
        let alice = AccountId::new("alice");
        let weth = AssetId::new("WETH");

        custody.mint(&alice, &weth, 1_000).unwrap();
        custody.transfer_in(&alice, &weth, 600).unwrap();
        assert_eq!(custody.balance_of(&alice, &weth), 400);
        assert_eq!(custody.reserve_of(&weth), 600);

        custody.transfer_out(&alice, &weth, 600).unwrap();
        assert_eq!(custody.balance_of(&alice, &weth), 1_000);
        assert_eq!(custody.reserve_of(&weth), 0);
    }

    #[test]
    fn test_failed_transfer_moves_nothing() {
        let custody = InMemoryCustody::new();
        let alice = AccountId::new("alice");
        let usdc = AssetId::new("USDC");

        custody.mint(&alice, &usdc, 10).unwrap();
        assert!(matches!(
            custody.transfer_in(&alice, &usdc, 11),
            Err(LegasiError::Custody(_))
        ));
        assert!(custody.transfer_out(&alice, &usdc, 1).is_err());
        assert_eq!(custody.balance_of(&alice, &usdc), 10);
        assert_eq!(custody.reserve_of(&usdc), 0);
    }
}
