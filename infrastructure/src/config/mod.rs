//! Configuration file loading for polis
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `POLIS_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./polis.toml` or `./.polis.toml`
//! 4. Global: `$XDG_CONFIG_HOME/polis/config.toml` (or the platform equivalent)
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileKnowledgeConfig, FileLoggingConfig, FileModelConfig,
    FileOrchestratorConfig, FileStorageConfig, StorageBackend,
};
pub use loader::ConfigLoader;
