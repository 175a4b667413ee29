use crate::error::DeliveryError;
use crate::types::ids::{AccountId, MovementId};
use async_trait::async_trait;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Account(AccountId),
    Movement(MovementId),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Account(id) => write!(f, "account:{}", id),
            CacheKey::Movement(id) => write!(f, "movement:{}", id),
        }
    }
}

#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, keys: &[CacheKey]) -> Result<(), DeliveryError>;
}
