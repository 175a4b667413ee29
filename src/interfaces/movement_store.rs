use crate::error::StorageError;
use crate::movement::record::{MovementRecord, MovementStatus, NewMovement};
use crate::types::ids::MovementId;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovementStore: Send + Sync {
    /// Persists a new record in `pending` and returns it with its assigned id.
    async fn create(&self, movement: NewMovement) -> Result<MovementRecord, StorageError>;
    async fn get(&self, movement_id: &MovementId) -> Result<Option<MovementRecord>, StorageError>;
    async fn update_status(
        &self,
        movement_id: &MovementId,
        status: MovementStatus,
    ) -> Result<(), StorageError>;
    /// Whole-record replacement of the mutable fields (amount, parties).
    async fn update(&self, record: MovementRecord) -> Result<MovementRecord, StorageError>;
    /// Soft delete (`trashed = true`) or restore (`trashed = false`).
    async fn set_trashed(
        &self,
        movement_id: &MovementId,
        trashed: bool,
    ) -> Result<MovementRecord, StorageError>;
}
