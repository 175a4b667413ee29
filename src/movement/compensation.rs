//! Compensation Engine
//!
//! Records every mutation a saga applies and, on failure, replays the inverse
//! of each one in reverse order. Undo failures never stop the unwind; they are
//! collected into a [`CompensationReport`] so that a clean rollback can be told
//! apart from one that left money inconsistent.

use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

use crate::error::StorageError;
use crate::interfaces::balance_store::BalanceStore;
use crate::interfaces::cache_invalidator::CacheKey;
use crate::interfaces::movement_store::MovementStore;
use crate::movement::record::MovementStatus;
use crate::types::balance::Balance;
use crate::types::ids::{AccountId, MovementId};

/// One step the saga has durably applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "mutation", rename_all = "snake_case")]
pub enum AppliedMutation {
    /// A balance was overwritten; undo writes `previous` back.
    BalanceWrite {
        account_id: AccountId,
        previous: Balance,
        written: Balance,
    },
    /// A movement record was created in `pending`; undo marks it `failed`.
    MovementCreated { movement_id: MovementId },
}

impl AppliedMutation {
    async fn undo(
        &self,
        balances: &dyn BalanceStore,
        movements: &dyn MovementStore,
    ) -> Result<(), StorageError> {
        match self {
            AppliedMutation::BalanceWrite { account_id, previous, .. } => {
                balances.set(account_id, *previous).await
            }
            AppliedMutation::MovementCreated { movement_id } => {
                movements
                    .update_status(movement_id, MovementStatus::Failed)
                    .await
            }
        }
    }

    /// Cached read that may have observed this mutation.
    pub fn cache_key(&self) -> CacheKey {
        match self {
            AppliedMutation::BalanceWrite { account_id, .. } => CacheKey::Account(account_id.clone()),
            AppliedMutation::MovementCreated { movement_id } => CacheKey::Movement(*movement_id),
        }
    }
}

impl fmt::Display for AppliedMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppliedMutation::BalanceWrite { account_id, previous, written } => {
                write!(f, "balance {} {} -> {}", account_id, previous, written)
            }
            AppliedMutation::MovementCreated { movement_id } => {
                write!(f, "movement {} created", movement_id)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoFailure {
    pub mutation: AppliedMutation,
    pub error: StorageError,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompensationReport {
    pub undone: Vec<AppliedMutation>,
    pub failures: Vec<UndoFailure>,
}

impl CompensationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.undone.len() + self.failures.len()
    }

    /// Keys of every mutation the unwind touched, undone or not.
    pub fn touched_keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = Vec::with_capacity(self.attempted());
        let mutations = self.undone.iter().chain(self.failures.iter().map(|f| &f.mutation));
        for key in mutations.map(AppliedMutation::cache_key) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

impl fmt::Display for CompensationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} undo steps succeeded",
            self.undone.len(),
            self.attempted()
        )?;
        for failure in &self.failures {
            write!(f, "; [{}] {}", failure.mutation, failure.error)?;
        }
        Ok(())
    }
}

/// Ordered stack of applied mutations for one saga run.
#[derive(Debug, Default)]
pub struct CompensationLog {
    applied: Vec<AppliedMutation>,
}

impl CompensationLog {
    pub fn new() -> Self {
        CompensationLog { applied: Vec::new() }
    }

    pub fn record(&mut self, mutation: AppliedMutation) {
        self.applied.push(mutation);
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    pub fn len(&self) -> usize {
        self.applied.len()
    }

    /// Undo every recorded mutation, most recent first. Every undo is attempted.
    pub async fn unwind(
        self,
        balances: &dyn BalanceStore,
        movements: &dyn MovementStore,
    ) -> CompensationReport {
        let mut report = CompensationReport::default();
        if self.applied.is_empty() {
            return report;
        }

        warn!(steps = self.applied.len(), "Compensating applied mutations");

        for mutation in self.applied.into_iter().rev() {
            match mutation.undo(balances, movements).await {
                Ok(()) => {
                    info!(mutation = %mutation, "Undo applied");
                    report.undone.push(mutation);
                }
                Err(e) => {
                    error!(mutation = %mutation, error = %e, "Undo failed");
                    report.failures.push(UndoFailure { mutation, error: e });
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::balance_store::MockBalanceStore;
    use crate::interfaces::movement_store::MockMovementStore;
    use mockall::Sequence;
    use mockall::predicate::eq;

    fn write(account: &str, previous: i64, written: i64) -> AppliedMutation {
        AppliedMutation::BalanceWrite {
            account_id: AccountId::new(account),
            previous: Balance::from_i64(previous),
            written: Balance::from_i64(written),
        }
    }

    #[tokio::test]
    async fn unwinds_in_reverse_order() {
        let mut balances = MockBalanceStore::new();
        let mut movements = MockMovementStore::new();
        let mut seq = Sequence::new();
        let movement_id = MovementId::new();

        movements
            .expect_update_status()
            .with(eq(movement_id), eq(MovementStatus::Failed))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        balances
            .expect_set()
            .with(eq(AccountId::new("dest")), eq(Balance::from_i64(500)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        balances
            .expect_set()
            .with(eq(AccountId::new("origin")), eq(Balance::from_i64(1000)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let mut log = CompensationLog::new();
        log.record(write("origin", 1000, 700));
        log.record(write("dest", 500, 800));
        log.record(AppliedMutation::MovementCreated { movement_id });

        let report = log.unwind(&balances, &movements).await;
        assert!(report.is_clean());
        assert_eq!(report.undone.len(), 3);
    }

    #[tokio::test]
    async fn keeps_going_after_an_undo_fails() {
        let mut balances = MockBalanceStore::new();
        let movements = MockMovementStore::new();
        let mut seq = Sequence::new();

        balances
            .expect_set()
            .with(eq(AccountId::new("dest")), eq(Balance::from_i64(500)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(StorageError::new("balance.set", "timeout")));
        balances
            .expect_set()
            .with(eq(AccountId::new("origin")), eq(Balance::from_i64(1000)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let mut log = CompensationLog::new();
        log.record(write("origin", 1000, 700));
        log.record(write("dest", 500, 800));

        let report = log.unwind(&balances, &movements).await;
        assert!(!report.is_clean());
        assert_eq!(report.attempted(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].mutation, write("dest", 500, 800));
        assert_eq!(report.undone, vec![write("origin", 1000, 700)]);
    }

    #[tokio::test]
    async fn empty_log_touches_nothing() {
        let balances = MockBalanceStore::new();
        let movements = MockMovementStore::new();

        let report = CompensationLog::new().unwind(&balances, &movements).await;
        assert!(report.is_clean());
        assert_eq!(report.attempted(), 0);
    }

    #[test]
    fn report_lists_failed_steps() {
        let report = CompensationReport {
            undone: vec![write("origin", 1000, 700)],
            failures: vec![UndoFailure {
                mutation: write("dest", 500, 800),
                error: StorageError::new("balance.set", "timeout"),
            }],
        };
        let text = report.to_string();
        assert!(text.starts_with("1 of 2 undo steps succeeded"));
        assert!(text.contains("balance dest 500 -> 800"));
    }

    #[test]
    fn touched_keys_cover_undone_and_failed_steps() {
        let movement_id = MovementId::new();
        let report = CompensationReport {
            undone: vec![
                AppliedMutation::MovementCreated { movement_id },
                write("origin", 1000, 700),
            ],
            failures: vec![UndoFailure {
                mutation: write("dest", 500, 800),
                error: StorageError::new("balance.set", "timeout"),
            }],
        };

        let keys = report.touched_keys();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&CacheKey::Movement(movement_id)));
        assert!(keys.contains(&CacheKey::Account(AccountId::new("origin"))));
        assert!(keys.contains(&CacheKey::Account(AccountId::new("dest"))));
    }
}
