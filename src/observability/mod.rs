pub mod metrics;
pub mod tracing;
pub mod instrument;
pub mod logging;
