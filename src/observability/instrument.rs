use std::future::Future;
use tracing::{Instrument, Span, error, info, warn};

use crate::error::Result;
use crate::observability::metrics::Metrics;

/// Runs `call` inside `span`, timing it and counting its outcome.
///
/// Every public orchestrator command goes through here instead of repeating
/// span/counter code per method.
pub async fn instrumented<T, F>(
    metrics: &Metrics,
    span: Span,
    operation: &'static str,
    call: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let timer = metrics
        .command_duration
        .with_label_values(&[operation])
        .start_timer();
    let result = call.instrument(span.clone()).await;
    timer.observe_duration();

    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    metrics
        .commands_total
        .with_label_values(&[operation, outcome])
        .inc();

    span.in_scope(|| match &result {
        Ok(_) => info!(operation, "Command completed"),
        Err(e) if e.requires_reconciliation() => {
            error!(operation, error = %e, "Command failed; reconciliation required")
        }
        Err(e) => warn!(operation, error = %e, kind = e.kind(), "Command rejected"),
    });

    result
}
