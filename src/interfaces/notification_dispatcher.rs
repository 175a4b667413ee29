use crate::error::DeliveryError;
use async_trait::async_trait;

/// Hands a payload to the message broker. Returning `Ok` means the payload
/// was accepted for delivery, not that it was delivered.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), DeliveryError>;
}
