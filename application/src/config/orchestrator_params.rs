//! Orchestrator parameters: round loop control.
//!
//! [`OrchestratorParams`] groups the static parameters that control the
//! round loop in [`Orchestrator`](crate::use_cases::orchestrator::Orchestrator).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Round loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorParams {
    /// Stop after this many rounds. `None` runs until stopped.
    pub max_rounds: Option<usize>,
    /// Upper bound on a single decision call.
    pub decision_timeout: Duration,
    /// Decision calls run concurrently within a round when greater than 1.
    /// Decisions are still applied one agent at a time, in index order.
    pub max_concurrent_decisions: usize,
    /// Pause between rounds.
    pub round_delay: Duration,
    /// Threads per `get_forum_posts` page.
    pub forum_page_size: usize,
    /// Offer the encyclopedia lookup tool.
    pub knowledge_enabled: bool,
}

impl Default for OrchestratorParams {
    fn default() -> Self {
        Self {
            max_rounds: None,
            decision_timeout: Duration::from_secs(300),
            max_concurrent_decisions: 1,
            round_delay: Duration::ZERO,
            forum_page_size: 20,
            knowledge_enabled: true,
        }
    }
}

impl OrchestratorParams {
    // ==================== Builder Methods ====================

    pub fn with_max_rounds(mut self, max: Option<usize>) -> Self {
        self.max_rounds = max;
        self
    }

    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = timeout;
        self
    }

    /// Zero is treated as 1.
    pub fn with_max_concurrent_decisions(mut self, max: usize) -> Self {
        self.max_concurrent_decisions = max.max(1);
        self
    }

    pub fn with_round_delay(mut self, delay: Duration) -> Self {
        self.round_delay = delay;
        self
    }

    pub fn with_forum_page_size(mut self, size: usize) -> Self {
        self.forum_page_size = size;
        self
    }

    pub fn with_knowledge(mut self, enabled: bool) -> Self {
        self.knowledge_enabled = enabled;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.max_concurrent_decisions > 1
    }
}
