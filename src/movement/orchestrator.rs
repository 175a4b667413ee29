//! Funds Movement Orchestrator
//!
//! Moves value between two balance records without a multi-table
//! transaction. Each command runs in two phases:
//!
//! 1. **Plan** (in the caller's future, cancellable): validate, resolve the
//!    parties, check funds, compute the new balances, check the deadline.
//! 2. **Saga** (detached tokio task, not cancellable): write the debit, write
//!    the credit, persist the movement record, write the terminal status,
//!    announce. Every applied step goes on a [`CompensationLog`]; any failure
//!    unwinds the log before the error is returned.
//!
//! Balance writes are read-modify-write. Concurrent commands touching the
//! same account can race and lose an update; per-account serialization (or a
//! version-checked balance store) must sit in front of this type before it
//! handles contended accounts.

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, warn};

use crate::config::notification::NotificationConfig;
use crate::error::{Error, Party, Result, StorageError};
use crate::interfaces::balance_store::BalanceStore;
use crate::interfaces::cache_invalidator::CacheInvalidator;
use crate::interfaces::merchant_directory::MerchantDirectory;
use crate::interfaces::movement_store::MovementStore;
use crate::interfaces::notification_dispatcher::NotificationDispatcher;
use crate::movement::compensation::{AppliedMutation, CompensationLog};
use crate::movement::completion::{CompletionStage, MovementEvent};
use crate::movement::outcome::MovementOutcome;
use crate::movement::record::{MovementKind, MovementRecord, MovementStatus, NewMovement};
use crate::movement::request::{
    CommandContext, DebitRequest, TransferRequest, TransferUpdateRequest,
};
use crate::observability::instrument::instrumented;
use crate::observability::metrics::Metrics;
use crate::observability::tracing::{trace_debit, trace_transfer, trace_transfer_update, trace_trash};
use crate::types::account::AccountBalance;
use crate::types::balance::Balance;
use crate::types::ids::{AccountId, MovementId};
use crate::utils::alerts::{alert_reconciliation_required, alert_saga_aborted};

/// One planned balance overwrite.
#[derive(Clone, Debug, PartialEq, Eq)]
struct BalanceLeg {
    account_id: AccountId,
    before: Balance,
    after: Balance,
}

/// Debit is always applied before credit.
#[derive(Clone, Debug, PartialEq, Eq)]
struct MutationPlan {
    amount: Balance,
    debit: BalanceLeg,
    credit: BalanceLeg,
}

impl MutationPlan {
    fn new(debit_side: AccountBalance, credit_side: AccountBalance, amount: Balance) -> Result<Self> {
        if !debit_side.covers(amount) {
            return Err(Error::InsufficientFunds {
                account_id: debit_side.account_id,
                available: debit_side.balance,
                requested: amount,
            });
        }

        let debit_after = debit_side
            .balance
            .checked_sub(amount)
            .ok_or_else(|| Error::Overflow { operation: "debit".to_string() })?;
        let credit_after = credit_side
            .balance
            .checked_add(amount)
            .ok_or_else(|| Error::Overflow { operation: "credit".to_string() })?;

        Ok(MutationPlan {
            amount,
            debit: BalanceLeg {
                account_id: debit_side.account_id,
                before: debit_side.balance,
                after: debit_after,
            },
            credit: BalanceLeg {
                account_id: credit_side.account_id,
                before: credit_side.balance,
                after: credit_after,
            },
        })
    }
}

#[derive(Clone)]
pub struct FundsMovementOrchestrator {
    balances: Arc<dyn BalanceStore>,
    movements: Arc<dyn MovementStore>,
    merchants: Arc<dyn MerchantDirectory>,
    completion: Arc<CompletionStage>,
    metrics: Arc<Metrics>,
}

impl FundsMovementOrchestrator {
    pub fn new(
        balances: Arc<dyn BalanceStore>,
        movements: Arc<dyn MovementStore>,
        merchants: Arc<dyn MerchantDirectory>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        invalidator: Arc<dyn CacheInvalidator>,
        notification_config: NotificationConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        let completion = Arc::new(CompletionStage::new(
            movements.clone(),
            dispatcher,
            invalidator,
            notification_config,
            metrics.clone(),
        ));

        FundsMovementOrchestrator {
            balances,
            movements,
            merchants,
            completion,
            metrics,
        }
    }

    /// Card-to-card transfer.
    pub async fn execute_transfer(
        &self,
        ctx: &CommandContext,
        req: TransferRequest,
    ) -> Result<MovementOutcome> {
        let span = trace_transfer(&req.origin, &req.destination);
        instrumented(&self.metrics, span, "execute_transfer", async move {
            req.validate()?;

            let origin = self.resolve_account(&req.origin).await?;
            let destination = self.resolve_account(&req.destination).await?;
            let plan = MutationPlan::new(origin, destination, req.amount)?;

            let movement = NewMovement {
                kind: MovementKind::Transfer,
                origin: req.origin,
                destination: req.destination,
                amount: req.amount,
            };

            ctx.ensure_not_expired()?;

            let this = self.clone();
            let saga = tokio::spawn(
                async move { this.run_creation("execute_transfer", plan, movement).await }
                    .in_current_span(),
            );
            join_saga("execute_transfer", saga).await
        })
        .await
    }

    /// Payment from a card holder to a merchant's settlement account.
    pub async fn execute_debit(
        &self,
        ctx: &CommandContext,
        req: DebitRequest,
    ) -> Result<MovementOutcome> {
        let span = trace_debit(&req.payer, &req.merchant_id);
        instrumented(&self.metrics, span, "execute_debit", async move {
            req.validate()?;

            let merchant = self
                .merchants
                .resolve(&req.merchant_id)
                .await?
                .ok_or(Error::PartyNotFound(Party::Merchant(req.merchant_id)))?;

            if merchant.settlement_account == req.payer {
                return Err(Error::SameParty(req.payer));
            }

            let payer = self.resolve_account(&req.payer).await?;
            let settlement = self.resolve_account(&merchant.settlement_account).await?;
            let plan = MutationPlan::new(payer, settlement, req.amount)?;

            let movement = NewMovement {
                kind: MovementKind::Transaction {
                    merchant_id: merchant.merchant_id,
                    payment_method: req.payment_method,
                },
                origin: req.payer,
                destination: merchant.settlement_account,
                amount: req.amount,
            };

            ctx.ensure_not_expired()?;

            let this = self.clone();
            let saga = tokio::spawn(
                async move { this.run_creation("execute_debit", plan, movement).await }
                    .in_current_span(),
            );
            join_saga("execute_debit", saga).await
        })
        .await
    }

    /// Change the amount of a successful movement, moving only the difference.
    pub async fn execute_transfer_update(
        &self,
        ctx: &CommandContext,
        req: TransferUpdateRequest,
    ) -> Result<MovementOutcome> {
        let span = trace_transfer_update(&req.movement_id);
        instrumented(&self.metrics, span, "execute_transfer_update", async move {
            req.validate()?;

            let current = self.resolve_movement(&req.movement_id).await?;
            let is_transfer = matches!(current.kind, MovementKind::Transfer);
            if !is_transfer || current.status != MovementStatus::Success || current.is_trashed() {
                return Err(Error::MovementNotAmendable {
                    movement_id: current.movement_id,
                    kind: current.kind.label(),
                    status: current.status,
                    trashed: current.is_trashed(),
                });
            }

            let delta = req
                .new_amount
                .checked_sub(current.amount)
                .ok_or_else(|| Error::Overflow { operation: "amount delta".to_string() })?;
            if delta == Balance::zero() {
                debug!("Amount unchanged; nothing to move");
                return Ok(MovementOutcome::new(current));
            }

            let origin = self.resolve_account(&current.origin).await?;
            let destination = self.resolve_account(&current.destination).await?;
            let plan = if delta.is_positive() {
                MutationPlan::new(origin, destination, delta)?
            } else {
                MutationPlan::new(destination, origin, delta.abs())?
            };

            let mut amended = current.clone();
            amended.amount = req.new_amount;
            amended.updated_at = Utc::now();

            ctx.ensure_not_expired()?;

            let this = self.clone();
            let saga = tokio::spawn(
                async move { this.run_amendment(plan, current, amended).await }
                    .in_current_span(),
            );
            join_saga("execute_transfer_update", saga).await
        })
        .await
    }

    /// Soft-delete a movement. Balances and status are untouched.
    pub async fn trash_movement(&self, movement_id: MovementId) -> Result<MovementOutcome> {
        self.set_trashed(movement_id, true).await
    }

    pub async fn restore_movement(&self, movement_id: MovementId) -> Result<MovementOutcome> {
        self.set_trashed(movement_id, false).await
    }

    async fn set_trashed(&self, movement_id: MovementId, trashed: bool) -> Result<MovementOutcome> {
        let operation = if trashed { "trash_movement" } else { "restore_movement" };
        let span = trace_trash(&movement_id, trashed);
        instrumented(&self.metrics, span, operation, async move {
            self.resolve_movement(&movement_id).await?;
            let record = self.movements.set_trashed(&movement_id, trashed).await?;
            let warnings = self.completion.invalidate_movement(movement_id).await;
            Ok(MovementOutcome { record, warnings })
        })
        .await
    }

    async fn resolve_account(&self, account_id: &AccountId) -> Result<AccountBalance> {
        self.balances
            .get(account_id)
            .await?
            .ok_or_else(|| Error::PartyNotFound(Party::Account(account_id.clone())))
    }

    async fn resolve_movement(&self, movement_id: &MovementId) -> Result<MovementRecord> {
        self.movements
            .get(movement_id)
            .await?
            .ok_or(Error::PartyNotFound(Party::Movement(*movement_id)))
    }

    /// Debit, then credit. Each successful write is logged for compensation.
    async fn apply_plan(
        &self,
        plan: &MutationPlan,
        log: &mut CompensationLog,
    ) -> std::result::Result<(), StorageError> {
        for leg in [&plan.debit, &plan.credit] {
            self.balances.set(&leg.account_id, leg.after).await?;
            log.record(AppliedMutation::BalanceWrite {
                account_id: leg.account_id.clone(),
                previous: leg.before,
                written: leg.after,
            });
            debug!(account_id = %leg.account_id, before = %leg.before, after = %leg.after, "Balance written");
        }
        Ok(())
    }

    async fn run_creation(
        &self,
        operation: &'static str,
        plan: MutationPlan,
        movement: NewMovement,
    ) -> Result<MovementOutcome> {
        let mut log = CompensationLog::new();

        if let Err(e) = self.apply_plan(&plan, &mut log).await {
            return Err(self.compensate(e.into(), log, None).await);
        }

        let record = match self.movements.create(movement).await {
            Ok(record) => record,
            Err(e) => return Err(self.compensate(e.into(), log, None).await),
        };
        let movement_id = record.movement_id;
        log.record(AppliedMutation::MovementCreated { movement_id });

        let record = match self.completion.mark_success(record).await {
            Ok(record) => record,
            Err(e) => return Err(self.status_reconciliation_failed(movement_id, e, log).await),
        };

        debug!(%movement_id, steps = log.len(), "Saga committed");
        info!(
            %movement_id,
            origin = %record.origin,
            destination = %record.destination,
            amount = %record.amount,
            "Movement succeeded"
        );

        self.metrics
            .moved_amount_total
            .with_label_values(&[operation])
            .inc_by(plan.amount.to_i64().unsigned_abs());

        let warnings = self.completion.announce(&record, MovementEvent::Created).await;
        Ok(MovementOutcome { record, warnings })
    }

    async fn run_amendment(
        &self,
        plan: MutationPlan,
        previous: MovementRecord,
        amended: MovementRecord,
    ) -> Result<MovementOutcome> {
        let mut log = CompensationLog::new();
        let movement_id = previous.movement_id;
        let previous_amount = previous.amount;

        if let Err(e) = self.apply_plan(&plan, &mut log).await {
            return Err(self.compensate(e.into(), log, Some(movement_id)).await);
        }

        let record = match self.movements.update(amended).await {
            Ok(record) => record,
            Err(e) => return Err(self.compensate(e.into(), log, Some(movement_id)).await),
        };

        debug!(%movement_id, steps = log.len(), "Saga committed");
        info!(
            %movement_id,
            previous_amount = %previous_amount,
            amount = %record.amount,
            "Movement amended"
        );

        self.metrics
            .moved_amount_total
            .with_label_values(&["execute_transfer_update"])
            .inc_by(plan.amount.to_i64().unsigned_abs());

        let warnings = self
            .completion
            .announce(&record, MovementEvent::Amended { previous_amount })
            .await;
        Ok(MovementOutcome { record, warnings })
    }

    /// Unwind `log`; the original error is returned unless the unwind itself
    /// left residue.
    async fn compensate(
        &self,
        cause: Error,
        log: CompensationLog,
        movement_id: Option<MovementId>,
    ) -> Error {
        if log.is_empty() {
            return cause;
        }

        warn!(error = %cause, steps = log.len(), "Saga step failed; rolling back");
        let report = log
            .unwind(self.balances.as_ref(), self.movements.as_ref())
            .await;
        self.metrics.record_compensation(report.is_clean());
        self.completion.evict_after_rollback(&report).await;

        if report.is_clean() {
            info!(undone = report.undone.len(), "Rolled back cleanly");
            cause
        } else {
            alert_reconciliation_required(movement_id, &cause.to_string(), &report);
            Error::CompensationFailed {
                cause: Box::new(cause),
                report,
            }
        }
    }

    /// The terminal status write failed after balances and record were
    /// persisted. Balances are compensated, the record is marked `failed` on a
    /// best-effort basis, and the case is always surfaced.
    async fn status_reconciliation_failed(
        &self,
        movement_id: MovementId,
        source: StorageError,
        log: CompensationLog,
    ) -> Error {
        warn!(%movement_id, error = %source, "Terminal status write failed; rolling back");
        let compensation = log
            .unwind(self.balances.as_ref(), self.movements.as_ref())
            .await;
        self.metrics.record_compensation(compensation.is_clean());
        self.completion.evict_after_rollback(&compensation).await;

        alert_reconciliation_required(
            Some(movement_id),
            &format!("terminal status write failed: {}", source),
            &compensation,
        );

        Error::StatusReconciliationFailed {
            movement_id,
            source,
            compensation,
        }
    }
}

async fn join_saga(
    operation: &'static str,
    saga: JoinHandle<Result<MovementOutcome>>,
) -> Result<MovementOutcome> {
    match saga.await {
        Ok(result) => result,
        Err(e) => {
            alert_saga_aborted(operation, &e.to_string());
            Err(Error::SagaAborted(e.to_string()))
        }
    }
}
