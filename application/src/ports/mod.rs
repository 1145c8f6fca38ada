//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod community_store;
pub mod decision_gateway;
pub mod file_store;
pub mod knowledge;
pub mod progress;
pub mod transcript_logger;
