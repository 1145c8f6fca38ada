//! Hand-written mocks shared by the use case tests.

use crate::ports::community_store::{CommunityStore, StoreError};
use crate::ports::decision_gateway::{DecisionGateway, GatewayError};
use crate::ports::transcript_logger::{TranscriptEvent, TranscriptLogger};
use async_trait::async_trait;
use polis_domain::{
    AgentKey, AgentRecord, ChatMessage, ForumPost, ForumThread, Message, RecordMutation, ThreadId,
    active_alias,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

// ==================== Store ====================

#[derive(Default)]
struct MockState {
    records: Vec<AgentRecord>,
    threads: Vec<ForumThread>,
    chat: Vec<ChatMessage>,
}

/// In-memory store with a switch to simulate backend faults.
#[derive(Default)]
pub struct MockStore {
    state: Mutex<MockState>,
    failing: AtomicBool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Backend("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CommunityStore for MockStore {
    async fn save_agent_record(&self, record: AgentRecord) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let key = record.key();
        if state.records.iter().any(|r| r.matches(&key)) {
            return Err(StoreError::KeyConflict(key.to_string()));
        }
        if record.active
            && let Some(alias) = active_alias(&state.records, &key)
        {
            return Err(identity_active(&key, alias));
        }
        state.records.push(record);
        Ok(())
    }

    async fn find_agent_record(&self, key: &AgentKey) -> Result<Option<AgentRecord>, StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state.records.iter().find(|r| r.matches(key)).cloned())
    }

    async fn list_agent_records(&self, active_only: bool) -> Result<Vec<AgentRecord>, StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .filter(|r| !active_only || r.active)
            .cloned()
            .collect())
    }

    async fn modify_agent_record(
        &self,
        key: &AgentKey,
        mutation: &RecordMutation,
    ) -> Result<AgentRecord, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if let Some(name) = mutation.new_name() {
            let target = key.renamed(name);
            if state.records.iter().any(|r| r.matches(&target)) {
                return Err(StoreError::KeyConflict(target.to_string()));
            }
        }
        if mutation.activates()
            && let Some(alias) = active_alias(&state.records, key)
        {
            return Err(identity_active(key, alias));
        }
        let record = state
            .records
            .iter_mut()
            .find(|r| r.matches(key))
            .ok_or_else(|| StoreError::RecordNotFound(key.to_string()))?;
        mutation.apply(record)?;
        Ok(record.clone())
    }

    async fn save_forum_thread(&self, thread: ForumThread) -> Result<(), StoreError> {
        self.check()?;
        self.state.lock().unwrap().threads.push(thread);
        Ok(())
    }

    async fn save_forum_reply(
        &self,
        thread_id: &ThreadId,
        reply: ForumPost,
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let thread = state
            .threads
            .iter_mut()
            .find(|t| &t.id == thread_id)
            .ok_or_else(|| StoreError::ThreadNotFound(thread_id.to_string()))?;
        thread.add_reply(reply);
        Ok(())
    }

    async fn list_forum_threads(&self) -> Result<Vec<ForumThread>, StoreError> {
        self.check()?;
        Ok(self.state.lock().unwrap().threads.clone())
    }

    async fn find_forum_thread(&self, id: &ThreadId) -> Result<Option<ForumThread>, StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state.threads.iter().find(|t| &t.id == id).cloned())
    }

    async fn save_chat_message(&self, message: ChatMessage) -> Result<(), StoreError> {
        self.check()?;
        self.state.lock().unwrap().chat.push(message);
        Ok(())
    }

    async fn list_chat_messages(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        self.check()?;
        let chat = self.state.lock().unwrap().chat.clone();
        let skip = limit.map_or(0, |l| chat.len().saturating_sub(l));
        Ok(chat.into_iter().skip(skip).collect())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.check()?;
        *self.state.lock().unwrap() = MockState::default();
        Ok(())
    }
}

fn identity_active(key: &AgentKey, alias: &AgentRecord) -> StoreError {
    StoreError::IdentityActive {
        requested: key.name.clone(),
        active_as: alias.name.clone(),
    }
}

/// Store that yields to the scheduler before every record write, the way a
/// backend with real I/O gives other callers a chance to interleave.
#[derive(Default)]
pub struct InterleavingStore {
    inner: MockStore,
}

impl InterleavingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommunityStore for InterleavingStore {
    async fn save_agent_record(&self, record: AgentRecord) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.inner.save_agent_record(record).await
    }

    async fn find_agent_record(&self, key: &AgentKey) -> Result<Option<AgentRecord>, StoreError> {
        let found = self.inner.find_agent_record(key).await;
        tokio::task::yield_now().await;
        found
    }

    async fn list_agent_records(&self, active_only: bool) -> Result<Vec<AgentRecord>, StoreError> {
        let records = self.inner.list_agent_records(active_only).await;
        tokio::task::yield_now().await;
        records
    }

    async fn modify_agent_record(
        &self,
        key: &AgentKey,
        mutation: &RecordMutation,
    ) -> Result<AgentRecord, StoreError> {
        tokio::task::yield_now().await;
        self.inner.modify_agent_record(key, mutation).await
    }

    async fn save_forum_thread(&self, thread: ForumThread) -> Result<(), StoreError> {
        self.inner.save_forum_thread(thread).await
    }

    async fn save_forum_reply(
        &self,
        thread_id: &ThreadId,
        reply: ForumPost,
    ) -> Result<(), StoreError> {
        self.inner.save_forum_reply(thread_id, reply).await
    }

    async fn list_forum_threads(&self) -> Result<Vec<ForumThread>, StoreError> {
        self.inner.list_forum_threads().await
    }

    async fn find_forum_thread(&self, id: &ThreadId) -> Result<Option<ForumThread>, StoreError> {
        self.inner.find_forum_thread(id).await
    }

    async fn save_chat_message(&self, message: ChatMessage) -> Result<(), StoreError> {
        self.inner.save_chat_message(message).await
    }

    async fn list_chat_messages(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        self.inner.list_chat_messages(limit).await
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.inner.clear_all().await
    }
}

// ==================== Gateway ====================

/// Gateway that answers from per-agent scripts.
///
/// The agent is recognized by the `Your name: <name>` line of the system
/// prompt. When an agent's script runs out, the fallback response is used.
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, GatewayError>>>>,
    fallback: String,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, Vec<Message>)>>,
}

impl ScriptedGateway {
    /// Every agent keeps running and does nothing.
    pub fn idle() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback: r#"{"thoughts":[],"tool_calls":[],"instructions_for_next_pass":"carry on","should_continue":true}"#
                .to_string(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn script(self, agent: &str, response: impl Into<String>) -> Self {
        self.push(agent, Ok(response.into()))
    }

    pub fn script_failure(self, agent: &str, error: GatewayError) -> Self {
        self.push(agent, Err(error))
    }

    fn push(self, agent: &str, response: Result<String, GatewayError>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(agent.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Agent names in call order.
    pub fn callers(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    /// History sent with each call, in call order.
    pub fn histories(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().iter().map(|(_, h)| h.clone()).collect()
    }
}

fn agent_name(system_prompt: &str) -> String {
    system_prompt
        .lines()
        .find_map(|l| l.strip_prefix("Your name: "))
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[async_trait]
impl DecisionGateway for ScriptedGateway {
    async fn decide(
        &self,
        system_prompt: &str,
        history: &[Message],
        _schema: &Value,
    ) -> Result<String, GatewayError> {
        let name = agent_name(system_prompt);
        self.calls
            .lock()
            .unwrap()
            .push((name.clone(), history.to_vec()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&name)
            .and_then(|q| q.pop_front());
        scripted.unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

// ==================== Logger ====================

/// Logger that keeps event types for assertions.
#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingLogger {
    pub fn event_types(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }
}

impl TranscriptLogger for RecordingLogger {
    fn log(&self, event: TranscriptEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type.to_string(), event.payload));
    }
}
