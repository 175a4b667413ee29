use serde::{Deserialize, Serialize};
use crate::types::balance::Balance;
use crate::types::ids::{AccountId, MerchantId};

/// Seed data for the in-memory backends used by the standalone binary.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub accounts: Vec<SeedAccount>,
    pub merchants: Vec<SeedMerchant>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SeedAccount {
    pub account_id: AccountId,
    pub balance: Balance,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SeedMerchant {
    pub merchant_id: MerchantId,
    pub name: String,
    pub settlement_account: AccountId,
}
