//! Storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which community store backs the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Lost when the process exits
    #[default]
    Memory,
    /// SQLite file at `sqlite_path`
    Sqlite,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Raw storage configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    pub backend: StorageBackend,
    pub sqlite_path: PathBuf,
    /// Directory agent-created files are written to
    pub uploads_dir: PathBuf,
    /// Wipe records, forum and chat before the first round
    pub reset_on_start: bool,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            sqlite_path: PathBuf::from("polis.db"),
            uploads_dir: PathBuf::from("uploads"),
            reset_on_start: true,
        }
    }
}
