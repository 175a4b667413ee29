pub mod kafka;
pub mod log;

pub use kafka::KafkaNotificationDispatcher;
pub use log::LogDispatcher;
