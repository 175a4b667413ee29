use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::types::balance::Balance;
use crate::types::ids::{AccountId, EntryId};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: EntryId,
    pub timestamp: DateTime<Utc>,
    pub entry_type: EntryType,
    pub account_id: AccountId,
    pub amount: Balance,  // Signed: positive = credit, negative = debit
    pub balance_after: Balance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    Opening,
    Write,
}

/// Append-only history of the writes applied to one account.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            entries: Vec::new(),
        }
    }

    pub fn record_entry(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Balance implied by summing every recorded delta; `None` on overflow.
    pub fn replay(&self) -> Option<Balance> {
        self.entries.iter()
            .try_fold(Balance::zero(), |total, e| total.checked_add(e.amount))
    }
}
