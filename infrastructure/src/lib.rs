//! Infrastructure layer for polis
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod files;
pub mod knowledge;
pub mod logging;
pub mod ollama;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileKnowledgeConfig, FileLoggingConfig,
    FileModelConfig, FileOrchestratorConfig, FileStorageConfig, StorageBackend,
};
pub use files::LocalFileStore;
pub use knowledge::{DEFAULT_WIKIPEDIA_ENDPOINT, WikipediaLookup};
pub use logging::JsonlTranscriptLogger;
pub use ollama::{OllamaDecisionGateway, OllamaSettings};
pub use storage::{InMemoryCommunityStore, SqliteCommunityStore};
