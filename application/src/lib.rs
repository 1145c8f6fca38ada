//! Application layer for polis
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::OrchestratorParams;
pub use ports::{
    community_store::{CommunityStore, StoreError},
    decision_gateway::{DecisionGateway, GatewayError},
    file_store::{FileStoreError, FileStorePort},
    knowledge::{KnowledgeError, KnowledgeLookupPort},
    progress::{NoProgress, RoundProgressNotifier, RoundSummary, TurnOutcome},
    transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger},
};
pub use use_cases::orchestrator::{Orchestrator, RunSummary, StopReason};
pub use use_cases::run_pass::{PassError, PassRequest, RunPassUseCase};
pub use use_cases::shared_interface::{InterfaceError, SharedInterface};
pub use use_cases::tool_dispatch::{ToolDispatcher, ToolOutcome};
