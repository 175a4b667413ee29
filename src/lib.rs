pub mod types;
pub mod error;
pub mod config;
pub mod interfaces;
pub mod movement;
pub mod settlement;
pub mod invariants;
pub mod cache;
pub mod notification;
pub mod observability;
pub mod api;
pub mod utils;

pub use error::{Error, Result};
pub use movement::FundsMovementOrchestrator;
