//! Encyclopedia configuration from TOML (`[knowledge]` section)

use serde::{Deserialize, Serialize};

/// Raw knowledge lookup configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileKnowledgeConfig {
    /// Offer `get_wikipedia_text` to agents
    pub enabled: bool,
    /// MediaWiki API endpoint
    pub endpoint: String,
}

impl Default for FileKnowledgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: crate::knowledge::DEFAULT_WIKIPEDIA_ENDPOINT.to_string(),
        }
    }
}
