use async_trait::async_trait;
use tracing::info;

use crate::error::DeliveryError;
use crate::interfaces::notification_dispatcher::NotificationDispatcher;

/// Dispatcher used when no broker is configured: the payload is logged.
#[derive(Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), DeliveryError> {
        info!(
            topic,
            key,
            payload = %String::from_utf8_lossy(payload),
            "Notification (broker disabled)"
        );
        Ok(())
    }
}
