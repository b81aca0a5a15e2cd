//! Optimistically-versioned in-memory account store.
//!
//! Behaves like a serializable database under contention: a transfer
//! snapshots the accounts it touches, then commits only if no concurrent
//! transfer bumped their versions in the meantime. A lost race rolls back
//! and surfaces SQLSTATE 40001, the same way a serializable engine asks
//! the client to restart the transaction.

use std::sync::RwLock;

use anyhow::{Context, Result};

use crate::ambient;
use crate::db_error::DbError;

struct Slot {
    version: u64,
    balance: i64,
}

/// In-memory account store with optimistic version checks.
pub struct VersionedStore {
    slots: RwLock<Vec<Slot>>,
}

impl VersionedStore {
    /// Create `accounts` accounts, each holding `initial_balance`.
    pub fn new(accounts: usize, initial_balance: i64) -> Self {
        let slots = (0..accounts)
            .map(|_| Slot {
                version: 0,
                balance: initial_balance,
            })
            .collect();
        Self {
            slots: RwLock::new(slots),
        }
    }

    pub fn accounts(&self) -> usize {
        self.slots.read().unwrap().len()
    }

    /// Total balance across all accounts. Transfers conserve this.
    pub fn total_balance(&self) -> i64 {
        self.slots.read().unwrap().iter().map(|s| s.balance).sum()
    }

    /// Move `amount` between two accounts in a fresh transaction scope.
    ///
    /// Fails with SQLSTATE 40001 if a concurrent transfer commits to either
    /// account between snapshot and commit; nothing is applied in that case.
    pub fn transfer(&self, from: usize, to: usize, amount: i64) -> Result<()> {
        let len = self.accounts();
        anyhow::ensure!(from < len && to < len, "account index out of range");
        anyhow::ensure!(from != to, "transfer endpoints must differ");

        let _txn = ambient::begin();
        let seen = self.snapshot(from, to);
        self.commit(from, to, amount, seen)
    }

    fn snapshot(&self, from: usize, to: usize) -> (u64, u64) {
        let slots = self.slots.read().unwrap();
        (slots[from].version, slots[to].version)
    }

    fn commit(&self, from: usize, to: usize, amount: i64, seen: (u64, u64)) -> Result<()> {
        let mut slots = self.slots.write().unwrap();
        if slots[from].version != seen.0 || slots[to].version != seen.1 {
            let conflict = DbError::serialization_failure(format!(
                "restart transaction: account {} or {} changed concurrently",
                from, to
            ));
            return Err(anyhow::Error::new(conflict)).context("transfer rolled back");
        }
        slots[from].balance -= amount;
        slots[from].version += 1;
        slots[to].balance += amount;
        slots[to].version += 1;
        Ok(())
    }
}
