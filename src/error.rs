use thiserror::Error;
use crate::movement::compensation::CompensationReport;
use crate::movement::record::MovementStatus;
use crate::types::balance::Balance;
use crate::types::ids::{AccountId, MerchantId, MovementId};
use std::fmt;

#[derive(Error, Debug)]
pub enum Error {
    // Request Validation Errors
    #[error("Invalid amount: {0} (must be positive)")]
    InvalidAmount(Balance),

    #[error("Origin and destination are the same account: {0}")]
    SameParty(AccountId),

    #[error("Deadline exceeded before any balance was mutated")]
    DeadlineExceeded,

    // Business Rule Errors
    #[error("Party not found: {0}")]
    PartyNotFound(Party),

    #[error("Insufficient funds on {account_id}: available={available}, requested={requested}")]
    InsufficientFunds {
        account_id: AccountId,
        available: Balance,
        requested: Balance,
    },

    #[error("Movement {movement_id} ({kind}) cannot be amended: status={status}, trashed={trashed}")]
    MovementNotAmendable {
        movement_id: MovementId,
        kind: &'static str,
        status: MovementStatus,
        trashed: bool,
    },

    // Saga Errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{cause}; compensation incomplete: {report}")]
    CompensationFailed {
        cause: Box<Error>,
        report: CompensationReport,
    },

    #[error("Status reconciliation failed for movement {movement_id}: {source}; {compensation}")]
    StatusReconciliationFailed {
        movement_id: MovementId,
        source: StorageError,
        compensation: CompensationReport,
    },

    #[error("Saga task aborted: {0}")]
    SagaAborted(String),

    // Arithmetic Errors
    #[error("Overflow in {operation}")]
    Overflow { operation: String },

    // Invariant Errors
    #[error("Invariant violation: {0}")]
    InvariantViolation(InvariantViolation),

    #[error("Reconciliation failed for {account_id}: ledger={expected}, balance={actual}")]
    ReconciliationFailed {
        account_id: AccountId,
        expected: Balance,
        actual: Balance,
    },

    #[error("Conservation of value violated: expected={expected}, actual={actual}")]
    ConservationOfValueViolation {
        expected: Balance,
        actual: Balance,
    },

    // Infrastructure Errors
    #[error("Kafka error: {0}")]
    KafkaError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable label used as the `outcome` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidAmount(_) | Error::SameParty(_) => "invalid_request",
            Error::DeadlineExceeded => "deadline_exceeded",
            Error::PartyNotFound(_) => "party_not_found",
            Error::InsufficientFunds { .. } => "insufficient_funds",
            Error::MovementNotAmendable { .. } => "not_amendable",
            Error::Storage(_) => "storage_error",
            Error::CompensationFailed { .. } => "compensation_failed",
            Error::StatusReconciliationFailed { .. } => "status_reconciliation_failed",
            Error::SagaAborted(_) => "saga_aborted",
            Error::Overflow { .. } => "overflow",
            Error::InvariantViolation(_)
            | Error::ReconciliationFailed { .. }
            | Error::ConservationOfValueViolation { .. } => "invariant_violation",
            Error::KafkaError(_)
            | Error::SerializationError(_)
            | Error::ConfigError(_)
            | Error::MetricsError(_)
            | Error::IoError(_) => "internal",
        }
    }

    /// Money may be left inconsistent; a human has to look at it.
    pub fn requires_reconciliation(&self) -> bool {
        matches!(
            self,
            Error::CompensationFailed { .. }
                | Error::StatusReconciliationFailed { .. }
                | Error::SagaAborted(_)
        )
    }
}

/// A persistence call failed. Stores never distinguish transient from
/// permanent failures; the core does not retry either way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {reason}")]
pub struct StorageError {
    pub operation: &'static str,
    pub reason: String,
}

impl StorageError {
    pub fn new(operation: &'static str, reason: impl Into<String>) -> Self {
        StorageError {
            operation,
            reason: reason.into(),
        }
    }
}

/// A notification or cache invalidation could not be handed off.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// The entity a lookup failed to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Party {
    Account(AccountId),
    Merchant(MerchantId),
    Movement(MovementId),
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Account(id) => write!(f, "account {}", id),
            Party::Merchant(id) => write!(f, "merchant {}", id),
            Party::Movement(id) => write!(f, "movement {}", id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvariantViolation {
    pub invariant: &'static str,
    pub details: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.invariant, self.details)
    }
}
