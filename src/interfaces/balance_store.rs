use crate::error::StorageError;
use crate::types::account::AccountBalance;
use crate::types::balance::Balance;
use crate::types::ids::AccountId;
use async_trait::async_trait;

/// Keyed balance storage. No cross-key atomicity and no atomic increment:
/// callers read, compute and write back the whole value.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn get(&self, account_id: &AccountId) -> Result<Option<AccountBalance>, StorageError>;
    async fn set(&self, account_id: &AccountId, balance: Balance) -> Result<(), StorageError>;
}
