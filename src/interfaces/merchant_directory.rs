use crate::error::StorageError;
use crate::types::ids::{AccountId, MerchantId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub merchant_id: MerchantId,
    pub name: String,
    /// Account credited when a card holder pays this merchant.
    pub settlement_account: AccountId,
}

#[async_trait]
pub trait MerchantDirectory: Send + Sync {
    async fn resolve(&self, merchant_id: &MerchantId) -> Result<Option<Merchant>, StorageError>;
}
