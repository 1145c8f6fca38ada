//! Run Pass use case
//!
//! One agent pass: build the prompt, ask the decision model, apply the
//! decision to the agent's notes and buffer.
//!
//! The pass is split in three steps so the orchestrator can run the model
//! calls of a round concurrently while applying decisions in order:
//!
//! ```text
//! prepare (&mut Agent) ──▶ decide (no agent borrow) ──▶ finish (&mut Agent)
//! ```
//!
//! A failed, timed out or unparsable decision leaves the agent untouched.

use crate::ports::decision_gateway::{DecisionGateway, GatewayError};
use crate::ports::transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger};
use chrono::Local;
use polis_domain::{
    Agent, AgentPromptTemplate, AppliedDecision, Decision, DecisionParseError, Message,
    NoteEnumeration, ToolSpec, decision_schema, parse_decision,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a pass produced no decision
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PassError {
    #[error("Decision call failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Decision call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed decision: {0}")]
    Malformed(#[from] DecisionParseError),
}

/// Everything the decision call needs, detached from the agent.
#[derive(Debug, Clone)]
pub struct PassRequest {
    pub agent_name: String,
    pub system_prompt: String,
    pub history: Vec<Message>,
    /// Note enumeration shown in the prompt; deletions are checked against it.
    pub enumeration: NoteEnumeration,
}

/// Use case for running a single agent pass
pub struct RunPassUseCase<G: DecisionGateway + 'static> {
    gateway: Arc<G>,
    tool_spec: ToolSpec,
    schema: Value,
    decision_timeout: Duration,
    logger: Arc<dyn TranscriptLogger>,
}

impl<G: DecisionGateway + 'static> RunPassUseCase<G> {
    pub fn new(gateway: Arc<G>, tool_spec: ToolSpec) -> Self {
        Self {
            gateway,
            tool_spec,
            schema: decision_schema(),
            decision_timeout: Duration::from_secs(300),
            logger: Arc::new(NoTranscriptLogger),
        }
    }

    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = timeout;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn TranscriptLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn tool_spec(&self) -> &ToolSpec {
        &self.tool_spec
    }

    pub fn model_name(&self) -> &str {
        self.gateway.model_name()
    }

    /// Run a full pass for `agent`.
    pub async fn execute(&self, agent: &mut Agent) -> Result<AppliedDecision, PassError> {
        let request = self.prepare(agent);
        let result = self.decide(&request).await;
        self.finish(agent, &request, result)
    }

    /// Truncate the buffer and render the system prompt.
    pub fn prepare(&self, agent: &mut Agent) -> PassRequest {
        let enumeration = agent.begin_pass();
        let system_prompt = AgentPromptTemplate::agent_system(agent, &self.tool_spec, Local::now());
        PassRequest {
            agent_name: agent.name().to_string(),
            system_prompt,
            history: agent.history(),
            enumeration,
        }
    }

    /// Ask the model, bounded by the decision timeout.
    pub async fn decide(&self, request: &PassRequest) -> Result<Decision, PassError> {
        debug!(
            "Requesting decision for {} ({} messages)",
            request.agent_name,
            request.history.len()
        );

        let call = self
            .gateway
            .decide(&request.system_prompt, &request.history, &self.schema);
        let raw = match tokio::time::timeout(self.decision_timeout, call).await {
            Ok(result) => result?,
            Err(_) => return Err(PassError::Timeout(self.decision_timeout)),
        };

        Ok(parse_decision(&raw)?)
    }

    /// Apply a decision result to the agent. Errors leave it unchanged.
    pub fn finish(
        &self,
        agent: &mut Agent,
        request: &PassRequest,
        result: Result<Decision, PassError>,
    ) -> Result<AppliedDecision, PassError> {
        let decision = match result {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Pass for {} failed: {}", request.agent_name, e);
                self.logger.log(TranscriptEvent::new(
                    "pass_failed",
                    json!({
                        "agent": request.agent_name,
                        "model": self.gateway.model_name(),
                        "error": e.to_string(),
                    }),
                ));
                return Err(e);
            }
        };

        self.logger.log(TranscriptEvent::new(
            "decision",
            json!({
                "agent": request.agent_name,
                "model": self.gateway.model_name(),
                "thoughts": decision.thoughts,
                "tool_calls": decision.tool_calls,
                "should_continue": decision.should_continue,
            }),
        ));

        let applied = agent.apply_decision(decision, &request.enumeration);
        debug!(
            "{}: {} tool calls, {} notes added, {} deleted",
            request.agent_name,
            applied.tool_calls.len(),
            applied.notes_added.len(),
            applied.notes_deleted
        );
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingLogger, ScriptedGateway};
    use polis_domain::{Credential, Participant, Role, community_tool_spec};

    fn agent(name: &str, notes: &[&str]) -> Agent {
        Agent::new(
            Participant::new(name, Credential::new(format!("secret-{}", name))),
            "A curious agent",
            "Say hello to everyone.",
            notes.iter().map(|n| n.to_string()).collect(),
        )
    }

    fn use_case(gateway: ScriptedGateway) -> RunPassUseCase<ScriptedGateway> {
        RunPassUseCase::new(Arc::new(gateway), community_tool_spec(true))
    }

    #[tokio::test]
    async fn test_pass_applies_decision() {
        let gateway = ScriptedGateway::idle().script(
            "Ada",
            r#"{
                "thoughts": ["The forum is quiet"],
                "notes": ["remember Grace"],
                "tool_calls": [{"name": "post_to_forum", "arguments": {"content": "hi"}}],
                "instructions_for_next_pass": "read replies",
                "should_continue": true
            }"#,
        );
        let use_case = use_case(gateway);
        let mut ada = agent("Ada", &[]);

        let applied = use_case.execute(&mut ada).await.unwrap();

        assert_eq!(applied.tool_calls.len(), 1);
        assert_eq!(applied.thoughts, vec!["The forum is quiet".to_string()]);
        assert!(applied.should_continue);
        assert_eq!(ada.notes().iter().collect::<Vec<_>>(), vec!["remember Grace"]);

        let last = ada.history().pop().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "Instructions from your last run:\nread replies");
    }

    #[tokio::test]
    async fn test_prompt_and_history_sent_to_gateway() {
        let gateway = Arc::new(ScriptedGateway::idle());
        let use_case = RunPassUseCase::new(gateway.clone(), community_tool_spec(true));
        let mut ada = agent("Ada", &["first", "second"]);

        let request = use_case.prepare(&mut ada);
        assert!(request.system_prompt.contains("Your name: Ada"));
        assert!(request.system_prompt.contains("0. first"));
        assert!(request.system_prompt.contains("1. second"));
        assert_eq!(request.enumeration.len(), 2);

        use_case.decide(&request).await.unwrap();
        let sent = gateway.histories();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0][0].content, "Say hello to everyone.");
    }

    #[tokio::test]
    async fn test_gateway_failure_is_a_no_op() {
        let gateway = ScriptedGateway::idle()
            .script_failure("Ada", GatewayError::ConnectionError("refused".into()));
        let logger = Arc::new(RecordingLogger::default());
        let use_case = use_case(gateway).with_logger(logger.clone());
        let mut ada = agent("Ada", &["keep me"]);
        let before = ada.history();

        let err = use_case.execute(&mut ada).await.unwrap_err();

        assert!(matches!(err, PassError::Gateway(_)));
        assert!(ada.is_running());
        assert_eq!(ada.history(), before);
        assert_eq!(ada.notes().len(), 1);
        assert_eq!(logger.event_types(), vec!["pass_failed"]);
    }

    #[tokio::test]
    async fn test_malformed_decision_is_a_no_op() {
        let gateway = ScriptedGateway::idle().script("Ada", "I would rather not answer in JSON");
        let use_case = use_case(gateway);
        let mut ada = agent("Ada", &[]);
        let before = ada.history();

        let err = use_case.execute(&mut ada).await.unwrap_err();

        assert!(matches!(err, PassError::Malformed(_)));
        assert_eq!(ada.history(), before);
    }

    #[tokio::test]
    async fn test_slow_decision_times_out() {
        let gateway = ScriptedGateway::idle().with_delay(Duration::from_millis(500));
        let use_case = use_case(gateway).with_decision_timeout(Duration::from_millis(20));
        let mut ada = agent("Ada", &[]);

        let err = use_case.execute(&mut ada).await.unwrap_err();

        assert_eq!(err, PassError::Timeout(Duration::from_millis(20)));
        assert!(ada.is_running());
    }

    #[tokio::test]
    async fn test_clear_all_notes_wins_over_delete() {
        let gateway = ScriptedGateway::idle().script(
            "Ada",
            r#"{"delete_notes": [0], "clear_all_notes": true, "notes": ["fresh"], "instructions_for_next_pass": "go"}"#,
        );
        let use_case = use_case(gateway);
        let mut ada = agent("Ada", &["a", "b", "c"]);

        use_case.execute(&mut ada).await.unwrap();

        assert_eq!(ada.notes().iter().collect::<Vec<_>>(), vec!["fresh"]);
    }

    #[tokio::test]
    async fn test_missing_continue_flag_keeps_running() {
        let gateway = ScriptedGateway::idle().script("Ada", r#"{"thoughts": ["hm"]}"#);
        let use_case = use_case(gateway);
        let mut ada = agent("Ada", &[]);

        let applied = use_case.execute(&mut ada).await.unwrap();

        assert!(applied.should_continue);
    }
}
