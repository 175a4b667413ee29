use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::StorageError;
use crate::interfaces::merchant_directory::{Merchant, MerchantDirectory};
use crate::types::ids::MerchantId;

#[derive(Default)]
pub struct MerchantRegistry {
    merchants: DashMap<MerchantId, Merchant>,
}

impl MerchantRegistry {
    pub fn new() -> Self {
        MerchantRegistry {
            merchants: DashMap::new(),
        }
    }

    pub fn register(&self, merchant: Merchant) {
        self.merchants.insert(merchant.merchant_id, merchant);
    }
}

#[async_trait]
impl MerchantDirectory for MerchantRegistry {
    async fn resolve(&self, merchant_id: &MerchantId) -> Result<Option<Merchant>, StorageError> {
        Ok(self.merchants.get(merchant_id).map(|m| m.value().clone()))
    }
}
