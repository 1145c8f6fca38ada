//! Application-level configuration.
//!
//! - [`OrchestratorParams`]: round loop control (rounds, timeouts, concurrency)

pub mod orchestrator_params;

pub use orchestrator_params::OrchestratorParams;
