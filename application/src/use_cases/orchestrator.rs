//! Orchestrator use case
//!
//! Owns the agent population and drives it round by round.
//!
//! A round dispatches exactly the agents present when it started, in index
//! order. Agents spawned during the round are appended to the population
//! but only become eligible in the next one, so spawning can never recurse
//! within a round.
//!
//! With `max_concurrent_decisions > 1` the decision calls of a round run
//! concurrently; the decisions are still applied and their tool calls
//! dispatched one agent at a time.

use super::run_pass::{PassError, PassRequest, RunPassUseCase};
use super::tool_dispatch::ToolDispatcher;
use crate::config::OrchestratorParams;
use crate::ports::decision_gateway::DecisionGateway;
use crate::ports::progress::{NoProgress, RoundProgressNotifier, RoundSummary, TurnOutcome};
use crate::ports::transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger};
use polis_domain::{Agent, AppliedDecision, Decision, ToolCommand, ToolCommandError};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop()` was called.
    Cancelled,
    /// The configured round limit was reached.
    MaxRounds,
    /// Every agent has stopped itself.
    NoRunningAgents,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Cancelled => "stopped",
            StopReason::MaxRounds => "round limit reached",
            StopReason::NoRunningAgents => "no agents left running",
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub rounds: usize,
    pub stop_reason: StopReason,
    /// Agents in memory, running or not.
    pub population: usize,
    pub running: usize,
}

type Decided = (PassRequest, Result<Decision, PassError>);

/// Use case for running the agent community
pub struct Orchestrator<G: DecisionGateway + 'static> {
    pass: Arc<RunPassUseCase<G>>,
    dispatcher: ToolDispatcher,
    params: OrchestratorParams,
    agents: Vec<Agent>,
    cancel: CancellationToken,
    progress: Arc<dyn RoundProgressNotifier>,
    logger: Arc<dyn TranscriptLogger>,
}

impl<G: DecisionGateway + 'static> Orchestrator<G> {
    pub fn new(
        pass: RunPassUseCase<G>,
        dispatcher: ToolDispatcher,
        params: OrchestratorParams,
    ) -> Self {
        Self {
            pass: Arc::new(pass),
            dispatcher,
            params,
            agents: Vec::new(),
            cancel: CancellationToken::new(),
            progress: Arc::new(NoProgress),
            logger: Arc::new(NoTranscriptLogger),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn RoundProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn TranscriptLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn params(&self) -> &OrchestratorParams {
        &self.params
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Token that stops the run when cancelled. Usable from other tasks.
    pub fn stop_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Let the in-flight agent finish, then skip the rest of the round.
    pub fn stop(&self) {
        info!("Stop requested");
        self.cancel.cancel();
    }

    /// Drop the population. A stopped orchestrator can be started again.
    pub fn reset(&mut self) {
        info!("Resetting population of {} agents", self.agents.len());
        self.agents.clear();
        self.cancel = CancellationToken::new();
    }

    /// Spawn `count` agents named `Agent <i>`. Returns how many joined.
    pub async fn spawn_initial(&mut self, count: usize) -> usize {
        let mut spawned = 0;
        for i in 0..count {
            let name = format!("Agent {}", i);
            let instructions = format!(
                "Agent {} is a helpful agent that can perform a variety of tasks.",
                i
            );
            match self.dispatcher.spawn(&name, &instructions, Vec::new()).await {
                Ok(agent) => {
                    self.progress.on_agent_spawned(agent.name(), None);
                    self.log_spawn(agent.name(), None);
                    self.agents.push(agent);
                    spawned += 1;
                }
                Err(e) => warn!("Could not create {}: {}", name, e),
            }
        }
        spawned
    }

    /// Spawn the initial population and run rounds until stopped, the
    /// round limit is hit, or no agent is running.
    pub async fn start(&mut self, agent_count: usize) -> RunSummary {
        let spawned = self.spawn_initial(agent_count).await;
        info!(
            "Starting community with {} agents (model: {})",
            spawned,
            self.pass.model_name()
        );

        let mut rounds = 0;
        let stop_reason = loop {
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if self.params.max_rounds.is_some_and(|max| rounds >= max) {
                break StopReason::MaxRounds;
            }
            if self.running_count() == 0 {
                break StopReason::NoRunningAgents;
            }

            rounds += 1;
            let summary = self.run_round(rounds).await;
            if summary.interrupted {
                break StopReason::Cancelled;
            }

            if !self.params.round_delay.is_zero() {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.params.round_delay) => {}
                }
            }
        };

        let summary = RunSummary {
            rounds,
            stop_reason,
            population: self.agents.len(),
            running: self.running_count(),
        };
        info!(
            "Run finished after {} rounds: {}",
            summary.rounds,
            summary.stop_reason.as_str()
        );
        summary
    }

    /// Run one round over the agents present at its start.
    pub async fn run_round(&mut self, round: usize) -> RoundSummary {
        let snapshot = self.agents.len();
        let eligible = self.agents[..snapshot]
            .iter()
            .filter(|a| a.is_running())
            .count();
        let mut summary = RoundSummary::new(round, eligible);
        self.progress.on_round_start(round, eligible);
        debug!("Round {}: {} of {} agents running", round, eligible, snapshot);

        let mut decided = if self.params.is_parallel() {
            self.decide_concurrently(snapshot).await
        } else {
            HashMap::new()
        };

        for index in 0..snapshot {
            if self.cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }
            if !self.agents[index].is_running() {
                summary.record(TurnOutcome::Skipped);
                continue;
            }

            let (outcome, calls, spawned) = self.take_turn(index, decided.remove(&index)).await;
            summary.record(outcome);
            summary.tool_calls += calls;
            summary.spawned += spawned.len();
            self.progress
                .on_agent_turn(round, self.agents[index].name(), outcome);
            self.agents.extend(spawned);
        }

        self.progress.on_round_complete(&summary);
        self.logger.log(TranscriptEvent::new(
            "round_complete",
            json!({
                "round": summary.round,
                "eligible": summary.eligible,
                "completed": summary.completed,
                "stopped": summary.stopped,
                "failed": summary.failed,
                "tool_calls": summary.tool_calls,
                "spawned": summary.spawned,
                "interrupted": summary.interrupted,
                "population": self.agents.len(),
            }),
        ));
        summary
    }

    /// Run the decision calls of the round's running agents concurrently.
    async fn decide_concurrently(&mut self, snapshot: usize) -> HashMap<usize, Decided> {
        let semaphore = Arc::new(Semaphore::new(self.params.max_concurrent_decisions));
        let mut join_set = JoinSet::new();

        for index in 0..snapshot {
            if !self.agents[index].is_running() {
                continue;
            }
            let request = self.pass.prepare(&mut self.agents[index]);
            let pass = Arc::clone(&self.pass);
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                let result = pass.decide(&request).await;
                (index, request, result)
            });
        }

        let mut decided = HashMap::new();
        loop {
            let joined = tokio::select! {
                _ = self.cancel.cancelled() => {
                    join_set.abort_all();
                    break;
                }
                joined = join_set.join_next() => joined,
            };
            match joined {
                Some(Ok((index, request, result))) => {
                    decided.insert(index, (request, result));
                }
                Some(Err(e)) => warn!("Decision task join error: {}", e),
                None => break,
            }
        }
        decided
    }

    /// One agent's turn. Returns the outcome, the number of tool calls
    /// dispatched and the agents it spawned.
    async fn take_turn(
        &mut self,
        index: usize,
        decided: Option<Decided>,
    ) -> (TurnOutcome, usize, Vec<Agent>) {
        let agent = &mut self.agents[index];
        let result = match decided {
            Some((request, result)) => self.pass.finish(agent, &request, result),
            None => self.pass.execute(agent).await,
        };
        let applied = match result {
            Ok(applied) => applied,
            Err(_) => return (TurnOutcome::Failed, 0, Vec::new()),
        };

        let ui = self.dispatcher.interface();
        if let Err(e) = ui.clear_activity(agent.participant()).await {
            debug!("Could not clear activity for {}: {}", agent.name(), e);
        }

        let mut outcome = TurnOutcome::Completed;
        if !applied.should_continue {
            agent.stop();
            self.dispatcher
                .record_activity(agent, format!("Agent {} stopped running", agent.name()))
                .await;
            if let Err(e) = ui.leave(agent.participant()).await {
                debug!("{} could not leave: {}", agent.name(), e);
            }
            agent.set_joined(false);
            info!("{} stopped running", agent.name());
            outcome = TurnOutcome::Stopped;
        }

        let AppliedDecision {
            tool_calls,
            thoughts,
            notes_added,
            ..
        } = applied;

        let mut spawned = Vec::new();
        let mut dispatched = 0;
        for call in &tool_calls {
            let command = match ToolCommand::from_call(self.pass.tool_spec(), call) {
                Ok(command) => command,
                Err(e) => {
                    warn!("{}: {}", agent.name(), e);
                    self.dispatcher.record_activity(agent, e.to_string()).await;
                    if !matches!(e, ToolCommandError::UnknownTool(_)) {
                        agent.push_tool_result(e.to_string());
                    }
                    continue;
                }
            };

            let tool = command.name();
            let result = self.dispatcher.dispatch(agent, command).await;
            dispatched += 1;
            self.dispatcher.record_activity(agent, &result.activity).await;
            if let Some(message) = result.tool_message {
                agent.push_tool_result(message);
            }
            self.logger.log(TranscriptEvent::new(
                "tool_call",
                json!({
                    "agent": agent.name(),
                    "tool": tool,
                    "arguments": call.arguments,
                    "succeeded": result.succeeded,
                }),
            ));

            if let Some(child) = result.spawned {
                self.progress.on_agent_spawned(child.name(), Some(agent.name()));
                log_spawn(self.logger.as_ref(), child.name(), Some(agent.name()));
                spawned.push(child);
            }
        }

        if let Err(e) = ui.clear_thoughts(agent.participant()).await {
            debug!("Could not clear thoughts for {}: {}", agent.name(), e);
        }
        for thought in thoughts {
            if let Err(e) = ui.add_thought(agent.participant(), thought).await {
                debug!("Could not record thought for {}: {}", agent.name(), e);
            }
        }
        for note in notes_added {
            self.dispatcher
                .record_activity(agent, format!("Note added: {}", note))
                .await;
        }

        (outcome, dispatched, spawned)
    }

    fn running_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_running()).count()
    }

    fn log_spawn(&self, agent: &str, parent: Option<&str>) {
        log_spawn(self.logger.as_ref(), agent, parent);
    }
}

fn log_spawn(logger: &dyn TranscriptLogger, agent: &str, parent: Option<&str>) {
    logger.log(TranscriptEvent::new(
        "agent_spawned",
        json!({ "agent": agent, "parent": parent }),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockStore, RecordingLogger, ScriptedGateway};
    use crate::use_cases::shared_interface::SharedInterface;
    use polis_domain::community_tool_spec;
    use std::time::Duration;

    fn orchestrator(
        gateway: Arc<ScriptedGateway>,
        params: OrchestratorParams,
    ) -> Orchestrator<ScriptedGateway> {
        let spec = community_tool_spec(false);
        let interface = Arc::new(SharedInterface::new(Arc::new(MockStore::new())));
        let pass = RunPassUseCase::new(gateway, spec.clone())
            .with_decision_timeout(params.decision_timeout);
        let dispatcher = ToolDispatcher::new(interface, spec);
        Orchestrator::new(pass, dispatcher, params)
    }

    const SPAWN_CHILD: &str = r#"{
        "tool_calls": [{
            "name": "create_agent",
            "arguments": {"name": "Child", "initial_instructions": "Say hi", "initial_notes": []}
        }],
        "instructions_for_next_pass": "see what Child does"
    }"#;

    const STOP: &str = r#"{"thoughts": ["done"], "should_continue": false}"#;

    async fn record(orch: &Orchestrator<ScriptedGateway>, name: &str) -> polis_domain::AgentRecord {
        orch.dispatcher()
            .interface()
            .members(false)
            .await
            .into_iter()
            .find(|r| r.name == name)
            .unwrap()
    }

    /// Cancels the run as soon as the first turn of a round ends.
    struct StopAfterFirstTurn(CancellationToken);

    impl RoundProgressNotifier for StopAfterFirstTurn {
        fn on_round_start(&self, _round: usize, _eligible: usize) {}
        fn on_agent_turn(&self, _round: usize, _agent: &str, _outcome: TurnOutcome) {
            self.0.cancel();
        }
        fn on_round_complete(&self, _summary: &RoundSummary) {}
    }

    #[tokio::test]
    async fn test_spawn_initial_names_agents() {
        let gateway = Arc::new(ScriptedGateway::idle());
        let mut orch = orchestrator(gateway, OrchestratorParams::default());

        assert_eq!(orch.spawn_initial(3).await, 3);

        let names: Vec<_> = orch.agents().iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["Agent 0", "Agent 1", "Agent 2"]);
        assert!(orch.agents().iter().all(|a| a.has_joined()));
        assert_eq!(orch.dispatcher().interface().active_members().await.len(), 3);
    }

    #[tokio::test]
    async fn test_spawned_agents_wait_for_next_round() {
        let gateway = Arc::new(ScriptedGateway::idle().script("Agent 0", SPAWN_CHILD));
        let mut orch = orchestrator(gateway.clone(), OrchestratorParams::default());
        orch.spawn_initial(2).await;

        let first = orch.run_round(1).await;

        assert_eq!(first.eligible, 2);
        assert_eq!(first.spawned, 1);
        assert_eq!(orch.agents().len(), 3);
        assert_eq!(gateway.callers(), vec!["Agent 0", "Agent 1"]);

        let second = orch.run_round(2).await;

        assert_eq!(second.eligible, 3);
        assert_eq!(
            gateway.callers(),
            vec!["Agent 0", "Agent 1", "Agent 0", "Agent 1", "Child"]
        );
        assert_eq!(orch.agents()[2].persona(), polis_domain::SPAWN_PERSONA);
    }

    #[tokio::test]
    async fn test_failed_pass_is_a_no_op() {
        let gateway = Arc::new(ScriptedGateway::idle().script_failure(
            "Agent 0",
            crate::ports::decision_gateway::GatewayError::Timeout,
        ));
        let mut orch = orchestrator(gateway, OrchestratorParams::default());
        orch.spawn_initial(2).await;

        let summary = orch.run_round(1).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.completed, 1);
        assert!(orch.agents()[0].is_running());
        // Activity from spawning is untouched because the pass never applied.
        assert_eq!(
            record(&orch, "Agent 0").await.activity.to_vec(),
            vec!["Agent Agent 0 created"]
        );
    }

    #[tokio::test]
    async fn test_stop_decision_leaves_and_ends_run() {
        let gateway = Arc::new(ScriptedGateway::idle().script("Agent 0", STOP));
        let mut orch = orchestrator(gateway.clone(), OrchestratorParams::default());

        let summary = orch.start(1).await;

        assert_eq!(summary.stop_reason, StopReason::NoRunningAgents);
        assert_eq!(summary.rounds, 1);
        assert_eq!(summary.population, 1);
        assert_eq!(summary.running, 0);

        let agent0 = record(&orch, "Agent 0").await;
        assert!(!agent0.active);
        assert!(agent0.left_at.is_some());
        assert_eq!(agent0.thoughts.to_vec(), vec!["done"]);
        assert_eq!(
            agent0.activity.to_vec(),
            vec!["Agent Agent 0 stopped running"]
        );
    }

    #[tokio::test]
    async fn test_max_rounds() {
        let gateway = Arc::new(ScriptedGateway::idle());
        let params = OrchestratorParams::default().with_max_rounds(Some(3));
        let mut orch = orchestrator(gateway.clone(), params);

        let summary = orch.start(2).await;

        assert_eq!(summary.stop_reason, StopReason::MaxRounds);
        assert_eq!(summary.rounds, 3);
        assert_eq!(gateway.callers().len(), 6);
    }

    #[tokio::test]
    async fn test_stop_skips_rest_of_round() {
        let gateway = Arc::new(ScriptedGateway::idle());
        let mut orch = orchestrator(gateway.clone(), OrchestratorParams::default());
        let progress = Arc::new(StopAfterFirstTurn(orch.stop_handle()));
        orch = orch.with_progress(progress);

        let summary = orch.start(3).await;

        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.rounds, 1);
        assert_eq!(gateway.callers(), vec!["Agent 0"]);
    }

    #[tokio::test]
    async fn test_reset_drops_population() {
        let gateway = Arc::new(ScriptedGateway::idle());
        let mut orch = orchestrator(gateway, OrchestratorParams::default());
        orch.spawn_initial(2).await;
        orch.stop();

        orch.reset();

        assert!(orch.agents().is_empty());
        assert!(!orch.stop_handle().is_cancelled());
    }

    #[tokio::test]
    async fn test_unknown_tools_are_ignored() {
        let gateway = Arc::new(ScriptedGateway::idle().script(
            "Agent 0",
            r#"{
                "tool_calls": [
                    {"name": "fly_to_the_moon", "arguments": {}},
                    {"name": "postToChat", "arguments": {"content": "hello"}}
                ],
                "notes": ["said hello"]
            }"#,
        ));
        let logger = Arc::new(RecordingLogger::default());
        let mut orch =
            orchestrator(gateway, OrchestratorParams::default()).with_logger(logger.clone());
        orch.spawn_initial(1).await;

        let summary = orch.run_round(1).await;

        assert_eq!(summary.completed, 1);
        assert_eq!(summary.tool_calls, 1);
        let chat = orch.dispatcher().interface().get_chat_history(None).await;
        assert_eq!(chat.len(), 1);
        assert_eq!(chat[0].content, "hello");

        let activity = record(&orch, "Agent 0").await.activity.to_vec();
        assert_eq!(
            activity,
            vec![
                "Unknown tool: fly_to_the_moon",
                "Posted to chat: hello",
                "Note added: said hello",
            ]
        );
        assert!(
            orch.agents()[0]
                .history()
                .iter()
                .all(|m| m.content != "Unknown tool: fly_to_the_moon")
        );
        assert_eq!(
            logger.event_types(),
            vec!["agent_spawned", "tool_call", "round_complete"]
        );
    }

    #[tokio::test]
    async fn test_query_results_reach_the_buffer() {
        let gateway = Arc::new(ScriptedGateway::idle().script(
            "Agent 0",
            r#"{"tool_calls": [{"name": "get_chat_history", "arguments": {"limit": 5}}]}"#,
        ));
        let mut orch = orchestrator(gateway, OrchestratorParams::default());
        orch.spawn_initial(1).await;

        orch.run_round(1).await;

        let last = orch.agents()[0].history().pop().unwrap();
        assert_eq!(last.role, polis_domain::Role::Tool);
        assert_eq!(last.content, "[]");
    }

    #[tokio::test]
    async fn test_parallel_decisions_apply_in_order() {
        let gateway = Arc::new(
            ScriptedGateway::idle()
                .with_delay(Duration::from_millis(10))
                .script("Agent 0", r#"{"tool_calls": [{"name": "post_to_chat", "arguments": {"content": "first"}}]}"#)
                .script("Agent 1", r#"{"tool_calls": [{"name": "post_to_chat", "arguments": {"content": "second"}}]}"#)
                .script("Agent 2", SPAWN_CHILD),
        );
        let params = OrchestratorParams::default().with_max_concurrent_decisions(3);
        let mut orch = orchestrator(gateway.clone(), params);
        orch.spawn_initial(3).await;

        let summary = orch.run_round(1).await;

        assert_eq!(summary.completed, 3);
        assert_eq!(summary.spawned, 1);
        assert_eq!(gateway.callers().len(), 3);
        let chat: Vec<_> = orch
            .dispatcher()
            .interface()
            .get_chat_history(None)
            .await
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(chat, vec!["first", "second"]);
    }
}
