use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::error::StorageError;
use crate::interfaces::movement_store::MovementStore;
use crate::invariants::checks::InvariantChecks;
use crate::movement::record::{MovementRecord, MovementStatus, NewMovement};
use crate::types::ids::MovementId;

/// In-memory [`MovementStore`]. Refuses status writes that would move a
/// record backwards.
#[derive(Default)]
pub struct MovementBook {
    records: DashMap<MovementId, MovementRecord>,
}

impl MovementBook {
    pub fn new() -> Self {
        MovementBook {
            records: DashMap::new(),
        }
    }

    pub fn all(&self) -> Vec<MovementRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl MovementStore for MovementBook {
    async fn create(&self, movement: NewMovement) -> Result<MovementRecord, StorageError> {
        let record = MovementRecord::from_new(MovementId::new(), movement);
        self.records.insert(record.movement_id, record.clone());
        Ok(record)
    }

    async fn get(&self, movement_id: &MovementId) -> Result<Option<MovementRecord>, StorageError> {
        Ok(self.records.get(movement_id).map(|r| r.value().clone()))
    }

    async fn update_status(
        &self,
        movement_id: &MovementId,
        status: MovementStatus,
    ) -> Result<(), StorageError> {
        let mut record = self.records.get_mut(movement_id).ok_or_else(|| {
            StorageError::new("movement.update_status", format!("unknown movement {}", movement_id))
        })?;

        InvariantChecks::check_status_transition(record.status, status)
            .map_err(|e| StorageError::new("movement.update_status", e.to_string()))?;

        record.status = status;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn update(&self, record: MovementRecord) -> Result<MovementRecord, StorageError> {
        let mut stored = self.records.get_mut(&record.movement_id).ok_or_else(|| {
            StorageError::new("movement.update", format!("unknown movement {}", record.movement_id))
        })?;

        // Status and soft-delete flag have their own operations.
        stored.kind = record.kind;
        stored.origin = record.origin;
        stored.destination = record.destination;
        stored.amount = record.amount;
        stored.updated_at = Utc::now();
        Ok(stored.value().clone())
    }

    async fn set_trashed(
        &self,
        movement_id: &MovementId,
        trashed: bool,
    ) -> Result<MovementRecord, StorageError> {
        let mut stored = self.records.get_mut(movement_id).ok_or_else(|| {
            StorageError::new("movement.set_trashed", format!("unknown movement {}", movement_id))
        })?;

        stored.deleted_at = if trashed { Some(Utc::now()) } else { None };
        stored.updated_at = Utc::now();
        Ok(stored.value().clone())
    }
}
