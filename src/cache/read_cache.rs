use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::error::DeliveryError;
use crate::interfaces::cache_invalidator::{CacheInvalidator, CacheKey};
use crate::movement::record::MovementRecord;
use crate::types::account::AccountBalance;
use crate::types::ids::{AccountId, MovementId};

#[derive(Clone, Debug)]
enum CachedValue {
    Account(AccountBalance),
    Movement(MovementRecord),
}

/// Read-side cache shared by the query path. Writers never populate it; they
/// only evict through [`CacheInvalidator`].
///
/// Every key carries a generation that each invalidation bumps. A read-through
/// fill is only accepted if the generation it observed before reading the store
/// is still current, so a value read before an eviction cannot land after it.
#[derive(Default)]
pub struct ReadCache {
    entries: DashMap<CacheKey, Slot>,
}

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u64,
    value: Option<CachedValue>,
}

impl ReadCache {
    pub fn new() -> Self {
        ReadCache {
            entries: DashMap::new(),
        }
    }

    pub fn account(&self, account_id: &AccountId) -> Option<AccountBalance> {
        match self.entries.get(&CacheKey::Account(account_id.clone()))?.value.as_ref()? {
            CachedValue::Account(balance) => Some(balance.clone()),
            CachedValue::Movement(_) => None,
        }
    }

    pub fn movement(&self, movement_id: &MovementId) -> Option<MovementRecord> {
        match self.entries.get(&CacheKey::Movement(*movement_id))?.value.as_ref()? {
            CachedValue::Movement(record) => Some(record.clone()),
            CachedValue::Account(_) => None,
        }
    }

    /// Read before going to the store; pass the result to `put_*`.
    pub fn generation(&self, key: &CacheKey) -> u64 {
        self.entries.get(key).map(|slot| slot.generation).unwrap_or(0)
    }

    /// Returns false if `key` was invalidated since `observed` was taken.
    pub fn put_account(&self, balance: AccountBalance, observed: u64) -> bool {
        self.fill(
            CacheKey::Account(balance.account_id.clone()),
            CachedValue::Account(balance),
            observed,
        )
    }

    pub fn put_movement(&self, record: MovementRecord, observed: u64) -> bool {
        self.fill(
            CacheKey::Movement(record.movement_id),
            CachedValue::Movement(record),
            observed,
        )
    }

    fn fill(&self, key: CacheKey, value: CachedValue, observed: u64) -> bool {
        let mut slot = self.entries.entry(key).or_default();
        if slot.generation != observed {
            return false;
        }
        slot.value = Some(value);
        true
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|slot| slot.value.is_some())
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|slot| slot.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheInvalidator for ReadCache {
    async fn invalidate(&self, keys: &[CacheKey]) -> Result<(), DeliveryError> {
        for key in keys {
            let mut slot = self.entries.entry(key.clone()).or_default();
            slot.generation = slot.generation.wrapping_add(1);
            if slot.value.take().is_some() {
                debug!(%key, "Evicted cached read");
            }
        }
        Ok(())
    }
}
