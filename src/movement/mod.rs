pub mod record;
pub mod request;
pub mod outcome;
pub mod compensation;
pub mod completion;
pub mod orchestrator;

pub use orchestrator::FundsMovementOrchestrator;
