//! Round loop configuration from TOML (`[orchestrator]` section)

use serde::{Deserialize, Serialize};

/// Raw orchestrator configuration from TOML
///
/// ```toml
/// [orchestrator]
/// agent_count = 20
/// max_rounds = 50              # omit to run until stopped
/// decision_timeout_seconds = 300
/// max_concurrent_decisions = 4 # > 1 runs decision calls in parallel
/// round_delay_ms = 0
/// forum_page_size = 20
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    /// Initial population
    pub agent_count: usize,
    pub max_rounds: Option<usize>,
    pub decision_timeout_seconds: u64,
    pub max_concurrent_decisions: usize,
    pub round_delay_ms: u64,
    pub forum_page_size: usize,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        Self {
            agent_count: 20,
            max_rounds: None,
            decision_timeout_seconds: 300,
            max_concurrent_decisions: 1,
            round_delay_ms: 0,
            forum_page_size: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestrator_config_deserialize() {
        let toml_str = r#"
[orchestrator]
agent_count = 5
max_rounds = 10
max_concurrent_decisions = 3
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.orchestrator.agent_count, 5);
        assert_eq!(config.orchestrator.max_rounds, Some(10));
        assert_eq!(config.orchestrator.max_concurrent_decisions, 3);
        // Unset fields keep their defaults
        assert_eq!(config.orchestrator.decision_timeout_seconds, 300);
        assert_eq!(config.orchestrator.forum_page_size, 20);
    }
}
