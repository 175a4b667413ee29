use crate::config::KafkaConfig;
use crate::error::{DeliveryError, Error, Result};
use crate::interfaces::notification_dispatcher::NotificationDispatcher;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::config::ClientConfig;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Publishes notifications to Kafka without waiting for broker acks.
///
/// `send` only enqueues; delivery reports are awaited on a background task
/// and logged.
pub struct KafkaNotificationDispatcher {
    producer: FutureProducer,
}

impl KafkaNotificationDispatcher {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .set("compression.type", "lz4")
            .create()
            .map_err(|e| Error::KafkaError(e.to_string()))?;

        Ok(KafkaNotificationDispatcher { producer })
    }
}

#[async_trait]
impl NotificationDispatcher for KafkaNotificationDispatcher {
    async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> std::result::Result<(), DeliveryError> {
        let record = FutureRecord::to(topic)
            .payload(payload)
            .key(key);

        let delivery = self
            .producer
            .send_result(record)
            .map_err(|(e, _)| DeliveryError(e.to_string()))?;

        let topic = topic.to_string();
        let key = key.to_string();
        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok(_)) => {
                    debug!(%topic, %key, "Notification delivered");
                }
                Ok(Err((e, _))) => {
                    warn!(%topic, %key, error = %e, "Notification delivery failed");
                }
                Err(_) => {
                    warn!(%topic, %key, "Notification delivery report dropped");
                }
            }
        });

        Ok(())
    }
}
