use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
};
use crate::error::Result;

/// Process-wide metric handles. Build once at startup with
/// [`Metrics::register`] and share through an `Arc`.
#[derive(Clone)]
pub struct Metrics {
    pub commands_total: IntCounterVec,
    pub command_duration: HistogramVec,
    pub compensations_total: IntCounterVec,
    pub delivery_warnings_total: IntCounterVec,
    pub moved_amount_total: IntCounterVec,
}

impl Metrics {
    pub fn register(registry: &Registry) -> Result<Self> {
        let commands_total = IntCounterVec::new(
            Opts::new("paygate_commands_total", "Funds movement commands by outcome"),
            &["operation", "outcome"],
        )?;

        let command_duration = HistogramVec::new(
            HistogramOpts::new(
                "paygate_command_duration_seconds",
                "Funds movement command latency"
            ).buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;

        let compensations_total = IntCounterVec::new(
            Opts::new("paygate_compensations_total", "Saga compensations by result"),
            &["result"],
        )?;

        let delivery_warnings_total = IntCounterVec::new(
            Opts::new(
                "paygate_delivery_warnings_total",
                "Post-commit notification or cache invalidation failures"
            ),
            &["target"],
        )?;

        let moved_amount_total = IntCounterVec::new(
            Opts::new("paygate_moved_amount_total", "Minor units moved by successful commands"),
            &["operation"],
        )?;

        registry.register(Box::new(commands_total.clone()))?;
        registry.register(Box::new(command_duration.clone()))?;
        registry.register(Box::new(compensations_total.clone()))?;
        registry.register(Box::new(delivery_warnings_total.clone()))?;
        registry.register(Box::new(moved_amount_total.clone()))?;

        Ok(Metrics {
            commands_total,
            command_duration,
            compensations_total,
            delivery_warnings_total,
            moved_amount_total,
        })
    }

    pub fn record_compensation(&self, clean: bool) {
        let result = if clean { "clean" } else { "partial" };
        self.compensations_total.with_label_values(&[result]).inc();
    }
}
