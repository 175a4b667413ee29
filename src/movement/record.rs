use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::types::balance::Balance;
use crate::types::ids::{AccountId, MerchantId, MovementId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    Pending,
    Success,
    Failed,
}

impl MovementStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MovementStatus::Success | MovementStatus::Failed)
    }

    /// Only `pending -> success` and `pending -> failed` are legal.
    pub fn can_transition_to(&self, next: MovementStatus) -> bool {
        matches!(
            (self, next),
            (MovementStatus::Pending, MovementStatus::Success)
                | (MovementStatus::Pending, MovementStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementStatus::Pending => "pending",
            MovementStatus::Success => "success",
            MovementStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementKind {
    /// Card-to-card transfer between two account holders.
    Transfer,
    /// Payment from a card holder to a merchant's settlement account.
    Transaction {
        merchant_id: MerchantId,
        payment_method: String,
    },
}

impl MovementKind {
    pub fn label(&self) -> &'static str {
        match self {
            MovementKind::Transfer => "transfer",
            MovementKind::Transaction { .. } => "transaction",
        }
    }
}

/// Fields supplied by the orchestrator when a movement is first persisted.
/// The store assigns the id, timestamps and the initial `pending` status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMovement {
    pub kind: MovementKind,
    pub origin: AccountId,
    pub destination: AccountId,
    pub amount: Balance,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub movement_id: MovementId,
    pub kind: MovementKind,
    pub origin: AccountId,
    pub destination: AccountId,
    pub amount: Balance,
    pub status: MovementStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MovementRecord {
    pub fn from_new(movement_id: MovementId, new: NewMovement) -> Self {
        let now = Utc::now();
        MovementRecord {
            movement_id,
            kind: new.kind,
            origin: new.origin,
            destination: new.destination,
            amount: new.amount,
            status: MovementStatus::Pending,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}
