pub mod balance_store;
pub mod movement_store;
pub mod merchant_directory;
pub mod notification_dispatcher;
pub mod cache_invalidator;
