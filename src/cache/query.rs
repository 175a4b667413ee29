use std::sync::Arc;
use tracing::debug;

use crate::cache::read_cache::ReadCache;
use crate::error::{Error, Party, Result};
use crate::interfaces::cache_invalidator::CacheKey;
use crate::interfaces::balance_store::BalanceStore;
use crate::interfaces::movement_store::MovementStore;
use crate::movement::record::MovementRecord;
use crate::types::account::AccountBalance;
use crate::types::ids::{AccountId, MovementId};

/// Cached read path over the same stores the orchestrator writes to.
#[derive(Clone)]
pub struct MovementQuery {
    cache: Arc<ReadCache>,
    balances: Arc<dyn BalanceStore>,
    movements: Arc<dyn MovementStore>,
}

impl MovementQuery {
    pub fn new(
        cache: Arc<ReadCache>,
        balances: Arc<dyn BalanceStore>,
        movements: Arc<dyn MovementStore>,
    ) -> Self {
        MovementQuery {
            cache,
            balances,
            movements,
        }
    }

    pub async fn find_movement(&self, movement_id: &MovementId) -> Result<MovementRecord> {
        if let Some(record) = self.cache.movement(movement_id) {
            return Ok(record);
        }

        let observed = self.cache.generation(&CacheKey::Movement(*movement_id));
        let record = self
            .movements
            .get(movement_id)
            .await?
            .ok_or(Error::PartyNotFound(Party::Movement(*movement_id)))?;
        if !self.cache.put_movement(record.clone(), observed) {
            debug!(%movement_id, "Movement changed while reading; not cached");
        }
        Ok(record)
    }

    pub async fn find_balance(&self, account_id: &AccountId) -> Result<AccountBalance> {
        if let Some(balance) = self.cache.account(account_id) {
            return Ok(balance);
        }

        let observed = self.cache.generation(&CacheKey::Account(account_id.clone()));
        let balance = self
            .balances
            .get(account_id)
            .await?
            .ok_or_else(|| Error::PartyNotFound(Party::Account(account_id.clone())))?;
        if !self.cache.put_account(balance.clone(), observed) {
            debug!(%account_id, "Balance changed while reading; not cached");
        }
        Ok(balance)
    }
}
