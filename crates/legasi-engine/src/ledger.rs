//! Position ledger
//!
//! Authoritative collateral and debt per account. Every mutation runs on a
//! cloned draft under the account's map entry and is committed only when the
//! whole operation succeeds, so readers never see a half-applied update and
//! concurrent writers to one account are serialized.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use legasi_common::{AccountId, Position, Result};

/// Per-account position store
#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: DashMap<AccountId, Position>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` on a draft of `account`'s position and commit it on `Ok`
    ///
    /// An account without a position gets an empty draft; it is only stored
    /// if `f` succeeds. `f` must not call back into the ledger.
    pub fn with_position<T>(
        &self,
        account: &AccountId,
        now: i64,
        f: impl FnOnce(&mut Position) -> Result<T>,
    ) -> Result<T> {
        match self.positions.entry(account.clone()) {
            Entry::Occupied(mut entry) => {
                let mut draft = entry.get().clone();
                let out = f(&mut draft)?;
                *entry.get_mut() = draft;
                Ok(out)
            }
            Entry::Vacant(entry) => {
                let mut draft = Position::new(account.clone(), now);
                let out = f(&mut draft)?;
                entry.insert(draft);
                Ok(out)
            }
        }
    }

    /// Like [`with_position`](Self::with_position) but never creates a position
    pub fn with_existing<T>(
        &self,
        account: &AccountId,
        f: impl FnOnce(&mut Position) -> Result<T>,
    ) -> Option<Result<T>> {
        let mut entry = self.positions.get_mut(account)?;
        let mut draft = entry.value().clone();
        let result = f(&mut draft);
        if result.is_ok() {
            *entry.value_mut() = draft;
        }
        Some(result)
    }

    pub fn get(&self, account: &AccountId) -> Option<Position> {
        self.positions.get(account).map(|p| p.clone())
    }

    /// Stored position or an empty one (reads never fail on unknown accounts)
    pub fn get_or_empty(&self, account: &AccountId, now: i64) -> Position {
        self.get(account)
            .unwrap_or_else(|| Position::new(account.clone(), now))
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.positions.contains_key(account)
    }

    /// Every account with a position, sorted
    pub fn accounts(&self) -> Vec<AccountId> {
        let mut accounts: Vec<_> = self.positions.iter().map(|p| p.key().clone()).collect();
        accounts.sort();
        accounts
    }

    /// Copy of every position, sorted by owner
    pub fn snapshot(&self) -> Vec<Position> {
        let mut positions: Vec<_> = self.positions.iter().map(|p| p.value().clone()).collect();
        positions.sort_by(|a, b| a.owner.cmp(&b.owner));
        positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legasi_common::{AssetId, LegasiError};
    use std::sync::Arc;

    #[test]
    fn test_failed_operation_creates_nothing() {
        let ledger = PositionLedger::new();
        let alice = AccountId::new("alice");

        let result = ledger.with_position(&alice, 1, |pos| pos.withdraw(&AssetId::new("WETH"), 1, 1));
        assert!(matches!(result, Err(LegasiError::InsufficientCollateral { .. })));
        assert!(!ledger.contains(&alice));
    }

    #[test]
    fn test_failed_operation_leaves_position_unchanged() {
        let ledger = PositionLedger::new();
        let alice = AccountId::new("alice");
        let weth = AssetId::new("WETH");

        ledger
            .with_position(&alice, 1, |pos| pos.deposit(&weth, 100, 1))
            .unwrap();
        let before = ledger.get(&alice).unwrap();

        let result = ledger.with_position(&alice, 2, |pos| {
            pos.withdraw(&weth, 50, 2)?;
            Err::<(), _>(LegasiError::MathOverflow)
        });
        assert!(result.is_err());
        assert_eq!(ledger.get(&alice).unwrap(), before);
    }

    #[test]
    fn test_with_existing_skips_unknown() {
        let ledger = PositionLedger::new();
        assert!(ledger.with_existing(&AccountId::new("ghost"), |_| Ok(())).is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_concurrent_deposits_are_not_lost() {
        let ledger = Arc::new(PositionLedger::new());
        let alice = AccountId::new("alice");
        let weth = AssetId::new("WETH");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                let alice = alice.clone();
                let weth = weth.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        ledger
                            .with_position(&alice, 1, |pos| pos.deposit(&weth, 1, 1))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.get(&alice).unwrap().collateral_of(&weth), 800);
    }
}
