//! Raw TOML configuration data types
//!
//! These structs mirror the config file section by section. Every field has
//! a default, so a partial file (or none at all) is valid.

mod knowledge;
mod logging;
mod model;
mod orchestrator;
mod storage;

pub use knowledge::FileKnowledgeConfig;
pub use logging::FileLoggingConfig;
pub use model::FileModelConfig;
pub use orchestrator::FileOrchestratorConfig;
pub use storage::{FileStorageConfig, StorageBackend};

use crate::ollama::OllamaSettings;
use polis_application::OrchestratorParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Round loop settings
    pub orchestrator: FileOrchestratorConfig,
    /// Model server settings
    pub model: FileModelConfig,
    /// Community store and uploads
    pub storage: FileStorageConfig,
    /// Encyclopedia lookups
    pub knowledge: FileKnowledgeConfig,
    pub logging: FileLoggingConfig,
}

/// A configuration value that cannot be used.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field}: must not be empty")]
    Empty { field: &'static str },

    #[error("{field}: must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: u64,
        value: u64,
    },

    #[error("model.temperature: must be between 0.0 and 2.0, got {0}")]
    Temperature(f32),

    #[error("{field}: '{value}' is not an http(s) URL")]
    NotHttpUrl { field: &'static str, value: String },
}

impl FileConfig {
    /// Check every section, returning all problems found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        let orchestrator = &self.orchestrator;
        for (field, value, min) in [
            ("orchestrator.decision_timeout_seconds", orchestrator.decision_timeout_seconds, 1),
            ("orchestrator.max_concurrent_decisions", orchestrator.max_concurrent_decisions as u64, 1),
            ("orchestrator.forum_page_size", orchestrator.forum_page_size as u64, 1),
            ("model.num_ctx", self.model.num_ctx as u64, 1),
        ] {
            if value < min {
                errors.push(ConfigValidationError::TooSmall { field, min, value });
            }
        }

        if self.model.name.trim().is_empty() {
            errors.push(ConfigValidationError::Empty { field: "model.name" });
        }
        check_url(&mut errors, "model.server_url", &self.model.server_url);

        if let Some(t) = self.model.temperature
            && !(0.0..=2.0).contains(&t)
        {
            errors.push(ConfigValidationError::Temperature(t));
        }

        if self.storage.backend == StorageBackend::Sqlite
            && self.storage.sqlite_path.as_os_str().is_empty()
        {
            errors.push(ConfigValidationError::Empty {
                field: "storage.sqlite_path",
            });
        }
        if self.storage.uploads_dir.as_os_str().is_empty() {
            errors.push(ConfigValidationError::Empty {
                field: "storage.uploads_dir",
            });
        }

        if self.knowledge.enabled {
            check_url(&mut errors, "knowledge.endpoint", &self.knowledge.endpoint);
        }

        errors
    }

    pub fn to_orchestrator_params(&self) -> OrchestratorParams {
        let o = &self.orchestrator;
        OrchestratorParams::default()
            .with_max_rounds(o.max_rounds)
            .with_decision_timeout(Duration::from_secs(o.decision_timeout_seconds))
            .with_max_concurrent_decisions(o.max_concurrent_decisions)
            .with_round_delay(Duration::from_millis(o.round_delay_ms))
            .with_forum_page_size(o.forum_page_size)
            .with_knowledge(self.knowledge.enabled)
    }

    pub fn ollama_settings(&self) -> OllamaSettings {
        OllamaSettings {
            server_url: self.model.server_url.clone(),
            model: self.model.name.clone(),
            num_ctx: self.model.num_ctx,
            temperature: self.model.temperature,
        }
    }
}

fn check_url(errors: &mut Vec<ConfigValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ConfigValidationError::Empty { field });
    } else if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(ConfigValidationError::NotHttpUrl {
            field,
            value: value.to_string(),
        });
    }
}
