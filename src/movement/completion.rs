//! Status/Notification glue
//!
//! Runs after the balance mutations of a saga have been applied: writes the
//! terminal status, then announces the movement to the notification broker
//! and the read-side cache. Announcement failures become
//! [`DeliveryWarning`]s and never change the movement's outcome.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::notification::NotificationConfig;
use crate::error::StorageError;
use crate::interfaces::cache_invalidator::{CacheInvalidator, CacheKey};
use crate::interfaces::movement_store::MovementStore;
use crate::interfaces::notification_dispatcher::NotificationDispatcher;
use crate::movement::compensation::CompensationReport;
use crate::movement::outcome::{DeliveryWarning, WarningTarget};
use crate::movement::record::{MovementKind, MovementRecord, MovementStatus};
use crate::observability::metrics::Metrics;
use crate::types::balance::Balance;
use crate::types::ids::MovementId;

/// What happened to the movement being announced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementEvent {
    Created,
    Amended { previous_amount: Balance },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub recipient: String,
    pub subject: String,
    pub summary: String,
    pub reference_link: String,
    pub movement_id: MovementId,
    pub kind: &'static str,
    pub amount: Balance,
}

impl NotificationPayload {
    pub fn build(record: &MovementRecord, event: MovementEvent, link_base: &str) -> Self {
        let (subject, summary) = match (&record.kind, event) {
            (MovementKind::Transfer, MovementEvent::Created) => (
                "Transfer completed".to_string(),
                format!(
                    "Transfer of {} from {} to {} completed",
                    record.amount, record.origin, record.destination
                ),
            ),
            (MovementKind::Transaction { payment_method, .. }, MovementEvent::Created) => (
                "Payment completed".to_string(),
                format!(
                    "Payment of {} from {} via {} completed",
                    record.amount, record.origin, payment_method
                ),
            ),
            (_, MovementEvent::Amended { previous_amount }) => (
                "Transfer updated".to_string(),
                format!(
                    "Transfer to {} updated from {} to {}",
                    record.destination, previous_amount, record.amount
                ),
            ),
        };

        NotificationPayload {
            recipient: record.origin.to_string(),
            subject,
            summary,
            reference_link: format!(
                "{}/{}",
                link_base.trim_end_matches('/'),
                record.movement_id
            ),
            movement_id: record.movement_id,
            kind: record.kind.label(),
            amount: record.amount,
        }
    }
}

pub struct CompletionStage {
    movements: Arc<dyn MovementStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    invalidator: Arc<dyn CacheInvalidator>,
    config: NotificationConfig,
    metrics: Arc<Metrics>,
}

impl CompletionStage {
    pub fn new(
        movements: Arc<dyn MovementStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        invalidator: Arc<dyn CacheInvalidator>,
        config: NotificationConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        CompletionStage {
            movements,
            dispatcher,
            invalidator,
            config,
            metrics,
        }
    }

    /// Terminal status write. The caller owns the failure path.
    pub async fn mark_success(
        &self,
        mut record: MovementRecord,
    ) -> Result<MovementRecord, StorageError> {
        self.movements
            .update_status(&record.movement_id, MovementStatus::Success)
            .await?;
        record.status = MovementStatus::Success;
        Ok(record)
    }

    /// Notify and invalidate. Never fails; returns whatever went wrong.
    pub async fn announce(
        &self,
        record: &MovementRecord,
        event: MovementEvent,
    ) -> Vec<DeliveryWarning> {
        let mut warnings = Vec::new();

        if let Err(warning) = self.notify(record, event).await {
            warnings.push(warning);
        }

        let keys = vec![
            CacheKey::Account(record.origin.clone()),
            CacheKey::Account(record.destination.clone()),
            CacheKey::Movement(record.movement_id),
        ];
        if let Err(e) = self.invalidator.invalidate(&keys).await {
            warnings.push(DeliveryWarning {
                target: WarningTarget::CacheInvalidation,
                detail: e.to_string(),
            });
        }

        for warning in &warnings {
            warn!(movement_id = %record.movement_id, %warning, "Post-commit step failed");
            self.metrics
                .delivery_warnings_total
                .with_label_values(&[warning.target.as_str()])
                .inc();
        }

        warnings
    }

    /// Invalidate cached reads of a single record (used by soft delete).
    pub async fn invalidate_movement(&self, movement_id: MovementId) -> Vec<DeliveryWarning> {
        self.evict(&[CacheKey::Movement(movement_id)])
            .await
            .into_iter()
            .collect()
    }

    /// Drop reads that may have seen values a rollback has since replaced.
    /// Runs after every unwind, clean or not.
    pub async fn evict_after_rollback(&self, report: &CompensationReport) {
        let keys = report.touched_keys();
        if keys.is_empty() {
            return;
        }
        if let Some(warning) = self.evict(&keys).await {
            warn!(%warning, keys = keys.len(), "Rolled-back reads may stay cached");
        }
    }

    async fn evict(&self, keys: &[CacheKey]) -> Option<DeliveryWarning> {
        let e = self.invalidator.invalidate(keys).await.err()?;
        self.metrics
            .delivery_warnings_total
            .with_label_values(&[WarningTarget::CacheInvalidation.as_str()])
            .inc();
        Some(DeliveryWarning {
            target: WarningTarget::CacheInvalidation,
            detail: e.to_string(),
        })
    }

    fn topic_for(&self, kind: &MovementKind, event: MovementEvent) -> &str {
        let topics = &self.config.topics;
        match (kind, event) {
            (_, MovementEvent::Amended { .. }) => &topics.transfer_updated,
            (MovementKind::Transfer, MovementEvent::Created) => &topics.transfer_created,
            (MovementKind::Transaction { .. }, MovementEvent::Created) => {
                &topics.transaction_created
            }
        }
    }

    async fn notify(
        &self,
        record: &MovementRecord,
        event: MovementEvent,
    ) -> Result<(), DeliveryWarning> {
        let payload = NotificationPayload::build(record, event, &self.config.link_base);
        let bytes = serde_json::to_vec(&payload).map_err(|e| DeliveryWarning {
            target: WarningTarget::Notification,
            detail: format!("payload serialization: {}", e),
        })?;

        let topic = self.topic_for(&record.kind, event);
        let key = record.movement_id.to_string();

        self.dispatcher
            .send(topic, &key, &bytes)
            .await
            .map_err(|e| DeliveryWarning {
                target: WarningTarget::Notification,
                detail: e.to_string(),
            })?;

        debug!(movement_id = %record.movement_id, topic, "Notification handed off");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ids::{AccountId, MerchantId};
    use crate::movement::record::NewMovement;

    fn record(kind: MovementKind, amount: i64) -> MovementRecord {
        MovementRecord::from_new(
            MovementId::new(),
            NewMovement {
                kind,
                origin: AccountId::new("4111"),
                destination: AccountId::new("4222"),
                amount: Balance::from_i64(amount),
            },
        )
    }

    #[test]
    fn transfer_payload_names_both_parties() {
        let record = record(MovementKind::Transfer, 300);
        let payload = NotificationPayload::build(&record, MovementEvent::Created, "https://x/m/");

        assert_eq!(payload.recipient, "4111");
        assert_eq!(payload.summary, "Transfer of 300 from 4111 to 4222 completed");
        assert_eq!(payload.reference_link, format!("https://x/m/{}", record.movement_id));
        assert_eq!(payload.kind, "transfer");
    }

    #[test]
    fn amended_payload_reports_both_amounts() {
        let record = record(MovementKind::Transfer, 500);
        let payload = NotificationPayload::build(
            &record,
            MovementEvent::Amended { previous_amount: Balance::from_i64(300) },
            "https://x/m",
        );
        assert_eq!(payload.subject, "Transfer updated");
        assert_eq!(payload.summary, "Transfer to 4222 updated from 300 to 500");
    }

    #[test]
    fn transaction_payload_mentions_payment_method() {
        let record = record(
            MovementKind::Transaction {
                merchant_id: MerchantId::new(),
                payment_method: "mastercard".to_string(),
            },
            120,
        );
        let payload = NotificationPayload::build(&record, MovementEvent::Created, "https://x/m");
        assert_eq!(payload.kind, "transaction");
        assert!(payload.summary.contains("via mastercard"));
    }
}
