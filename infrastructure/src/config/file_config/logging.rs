//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of decisions, tool calls and rounds
    pub transcript_path: Option<PathBuf>,
    /// Directory for daily rolling diagnostic logs
    pub dir: Option<PathBuf>,
}
