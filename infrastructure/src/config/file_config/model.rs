//! Model server configuration from TOML (`[model]` section)

use serde::{Deserialize, Serialize};

/// Raw model configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// Base URL of the Ollama server
    pub server_url: String,
    /// Model tag, e.g. `llama3.1:8b`
    pub name: String,
    /// Context window requested per call
    pub num_ctx: u32,
    pub temperature: Option<f32>,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            name: "llama3.1:8b".to_string(),
            num_ctx: 100_000,
            temperature: None,
        }
    }
}
