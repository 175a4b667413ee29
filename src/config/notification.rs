use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// When false, payloads are logged instead of sent to Kafka.
    pub enabled: bool,
    /// Prefix for the reference link included in every notification.
    pub link_base: String,
    pub topics: NotificationTopics,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            enabled: false,
            link_base: "https://paygate.local/movements".to_string(),
            topics: NotificationTopics::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationTopics {
    pub transfer_created: String,
    pub transfer_updated: String,
    pub transaction_created: String,
}

impl Default for NotificationTopics {
    fn default() -> Self {
        NotificationTopics {
            transfer_created: "email-service-topic-transfer-create".to_string(),
            transfer_updated: "email-service-topic-transfer-update".to_string(),
            transaction_created: "email-service-topic-transaction-create".to_string(),
        }
    }
}
