use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::StorageError;
use crate::interfaces::balance_store::BalanceStore;
use crate::settlement::ledger::{EntryType, Ledger, LedgerEntry};
use crate::types::account::AccountBalance;
use crate::types::balance::Balance;
use crate::types::ids::{AccountId, EntryId};

struct Slot {
    balance: AccountBalance,
    ledger: Ledger,
}

/// In-memory [`BalanceStore`] with a per-account write ledger.
///
/// Like the production store it offers no cross-key atomicity: `set` replaces
/// one account's value and nothing else.
#[derive(Default)]
pub struct BalanceBook {
    accounts: DashMap<AccountId, Slot>,
}

impl BalanceBook {
    pub fn new() -> Self {
        BalanceBook {
            accounts: DashMap::new(),
        }
    }

    /// Provision an account. Opening balances are recorded in the ledger.
    pub fn open_account(
        &self,
        account_id: AccountId,
        initial: Balance,
    ) -> Result<AccountBalance, StorageError> {
        match self.accounts.entry(account_id.clone()) {
            Entry::Occupied(_) => Err(StorageError::new(
                "balance.open",
                format!("account {} already exists", account_id),
            )),
            Entry::Vacant(slot) => {
                let balance = AccountBalance::new(account_id.clone(), initial);
                let mut ledger = Ledger::new();
                ledger.record_entry(LedgerEntry {
                    entry_id: EntryId::new(),
                    timestamp: balance.updated_at,
                    entry_type: EntryType::Opening,
                    account_id,
                    amount: initial,
                    balance_after: initial,
                });
                slot.insert(Slot {
                    balance: balance.clone(),
                    ledger,
                });
                Ok(balance)
            }
        }
    }

    pub fn balance_of(&self, account_id: &AccountId) -> Option<Balance> {
        self.accounts.get(account_id).map(|slot| slot.balance.balance)
    }

    pub fn snapshot(&self) -> Vec<AccountBalance> {
        self.accounts.iter().map(|slot| slot.balance.clone()).collect()
    }

    pub fn ledger(&self, account_id: &AccountId) -> Option<Ledger> {
        self.accounts.get(account_id).map(|slot| slot.ledger.clone())
    }
}

#[async_trait]
impl BalanceStore for BalanceBook {
    async fn get(&self, account_id: &AccountId) -> Result<Option<AccountBalance>, StorageError> {
        Ok(self.accounts.get(account_id).map(|slot| slot.balance.clone()))
    }

    async fn set(&self, account_id: &AccountId, balance: Balance) -> Result<(), StorageError> {
        let mut slot = self.accounts.get_mut(account_id).ok_or_else(|| {
            StorageError::new("balance.set", format!("unknown account {}", account_id))
        })?;

        let delta = balance.checked_sub(slot.balance.balance).ok_or_else(|| {
            StorageError::new("balance.set", format!("write delta overflows for {}", account_id))
        })?;
        slot.balance.balance = balance;
        slot.balance.updated_at = Utc::now();

        let timestamp = slot.balance.updated_at;
        slot.ledger.record_entry(LedgerEntry {
            entry_id: EntryId::new(),
            timestamp,
            entry_type: EntryType::Write,
            account_id: account_id.clone(),
            amount: delta,
            balance_after: balance,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_replace_value_and_append_ledger() {
        let book = BalanceBook::new();
        let id = AccountId::new("4111");
        book.open_account(id.clone(), Balance::from_i64(1000)).unwrap();

        book.set(&id, Balance::from_i64(700)).await.unwrap();
        book.set(&id, Balance::from_i64(900)).await.unwrap();

        let stored = book.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.balance, Balance::from_i64(900));

        let ledger = book.ledger(&id).unwrap();
        assert_eq!(ledger.entries().len(), 3);
        assert_eq!(ledger.entries()[1].amount, Balance::from_i64(-300));
        assert_eq!(ledger.replay(), Some(Balance::from_i64(900)));
    }

    #[tokio::test]
    async fn unknown_accounts() {
        let book = BalanceBook::new();
        let id = AccountId::new("missing");
        assert!(book.get(&id).await.unwrap().is_none());
        assert!(book.set(&id, Balance::from_i64(1)).await.is_err());
    }

    #[test]
    fn cannot_open_twice() {
        let book = BalanceBook::new();
        let id = AccountId::new("4111");
        book.open_account(id.clone(), Balance::zero()).unwrap();
        assert!(book.open_account(id, Balance::zero()).is_err());
    }

    #[tokio::test]
    async fn overflowing_write_delta_leaves_the_account_untouched() {
        let book = BalanceBook::new();
        let id = AccountId::new("4111");
        book.open_account(id.clone(), Balance::from_i64(-2)).unwrap();

        let err = book.set(&id, Balance::from_i64(i64::MAX)).await.unwrap_err();
        assert_eq!(err.operation, "balance.set");

        assert_eq!(book.balance_of(&id), Some(Balance::from_i64(-2)));
        assert_eq!(book.ledger(&id).unwrap().entries().len(), 1);
    }
}
