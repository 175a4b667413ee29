use crate::movement::compensation::CompensationReport;
use crate::types::ids::MovementId;

/// Alert operations: money may be inconsistent and needs manual reconciliation.
pub fn alert_reconciliation_required(
    movement_id: Option<MovementId>,
    reason: &str,
    report: &CompensationReport,
) {
    let movement = movement_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());

    tracing::error!(
        alert = "reconciliation_required",
        movement_id = %movement,
        failed_undos = report.failures.len(),
        "CRITICAL ALERT: {} ({})",
        reason,
        report
    );

    for failure in &report.failures {
        tracing::error!(
            alert = "reconciliation_required",
            movement_id = %movement,
            mutation = %failure.mutation,
            error = %failure.error,
            "Residual mutation left in place"
        );
    }
}

/// Alert operations: a saga task died before reporting its outcome.
pub fn alert_saga_aborted(operation: &str, detail: &str) {
    tracing::error!(
        alert = "saga_aborted",
        operation,
        "CRITICAL ALERT: saga task aborted: {}",
        detail
    );
}
