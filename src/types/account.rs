use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::types::balance::Balance;
use crate::types::ids::AccountId;

/// Current balance ("saldo") held for one account.
///
/// Owned by the provisioning side; the funds-movement core only reads it and
/// replaces the whole value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub balance: Balance,
    pub updated_at: DateTime<Utc>,
}

impl AccountBalance {
    pub fn new(account_id: AccountId, balance: Balance) -> Self {
        AccountBalance {
            account_id,
            balance,
            updated_at: Utc::now(),
        }
    }

    pub fn covers(&self, amount: Balance) -> bool {
        self.balance >= amount
    }
}
