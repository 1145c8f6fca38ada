//! Progress notification port
//!
//! Defines the interface for reporting progress while the orchestrator
//! runs rounds.

/// How one agent's turn in a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The pass succeeded and its tool calls were dispatched.
    Completed,
    /// The pass succeeded and the agent chose to stop.
    Stopped,
    /// The decision call failed, timed out or was malformed.
    Failed,
    /// The agent was not running.
    Skipped,
}

impl TurnOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnOutcome::Completed => "completed",
            TurnOutcome::Stopped => "stopped",
            TurnOutcome::Failed => "failed",
            TurnOutcome::Skipped => "skipped",
        }
    }
}

/// Totals for one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: usize,
    /// Population size at round start; only these agents were eligible.
    pub eligible: usize,
    pub completed: usize,
    pub stopped: usize,
    pub failed: usize,
    pub skipped: usize,
    pub tool_calls: usize,
    pub spawned: usize,
    /// The round ended early because the orchestrator was stopped.
    pub interrupted: bool,
}

impl RoundSummary {
    pub fn new(round: usize, eligible: usize) -> Self {
        Self {
            round,
            eligible,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: TurnOutcome) {
        match outcome {
            TurnOutcome::Completed => self.completed += 1,
            TurnOutcome::Stopped => self.stopped += 1,
            TurnOutcome::Failed => self.failed += 1,
            TurnOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Callback for progress updates during a run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait RoundProgressNotifier: Send + Sync {
    /// Called when a round starts with `eligible` agents in its snapshot
    fn on_round_start(&self, round: usize, eligible: usize);

    /// Called when an agent's turn finishes
    fn on_agent_turn(&self, round: usize, agent: &str, outcome: TurnOutcome);

    /// Called when a round completes
    fn on_round_complete(&self, summary: &RoundSummary);

    /// Called when an agent joins the population.
    fn on_agent_spawned(&self, _agent: &str, _parent: Option<&str>) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl RoundProgressNotifier for NoProgress {
    fn on_round_start(&self, _round: usize, _eligible: usize) {}
    fn on_agent_turn(&self, _round: usize, _agent: &str, _outcome: TurnOutcome) {}
    fn on_round_complete(&self, _summary: &RoundSummary) {}
}
